use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::Parser;

#[derive(Parser)]
#[command(name = "generate_sample")]
#[command(about = "Write a synthetic student follow-up CSV", long_about = None)]
struct Cli {
    /// Output CSV path
    #[arg(default_value = "sample_followups.csv")]
    output: PathBuf,
    /// Number of records to generate
    #[arg(long, default_value_t = 400)]
    records: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const PROGRAMS: &[&str] = &["BBA", "BS Computer Science", "BS Accounting", "MBA", "BS Psychology"];
const STATUSES: &[&str] = &["Active", "Not Reachable", "Dropped", "Will Rejoin", "Freeze"];
const REASONS: &[&str] = &[
    "Financial Issue",
    "Health Issue",
    "Job Commitments",
    "Family Matters",
    "Transport",
    "Relocation",
    "Lack of Interest",
];
const STAFF: &[&str] = &["Ayesha", "Bilal", "Hina", "Usman"];
const REMARKS: &[&str] = &[
    "called twice, no answer",
    "student will pay fee next week",
    "requested fee installment plan",
    "parents contacted about attendance",
    "phone switched off",
    "will rejoin next semester",
    "asked for semester freeze form",
    "medical certificate submitted",
    "shifted to another city",
    "promised to attend classes from monday",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Balances are written the way the office exports them: thousands
/// separators, occasional blanks and free-text placeholders.
fn balance_cell(rng: &mut SimpleRng) -> String {
    if rng.chance(0.04) {
        return String::new();
    }
    if rng.chance(0.02) {
        return "cleared".to_string();
    }
    let amount = rng.gauss(45_000.0, 20_000.0).max(0.0).round() as u64;
    group_thousands(amount)
}

/// `45000` → `"45,000"`. Mirrors `summary::format_thousands` in the
/// dashboard, which this binary cannot import; keep the two in step.
fn group_thousands(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn record(rng: &mut SimpleRng, sr: usize, start: NaiveDate) -> Vec<String> {
    let week = 1 + rng.below(16);
    let follow_ups = 1 + rng.below(5);
    let date = start + Duration::days((week as i64 - 1) * 7 + rng.below(7) as i64);
    let status = rng.pick(STATUSES);
    let reason = if status == "Active" && rng.chance(0.6) {
        ""
    } else {
        rng.pick(REASONS)
    };
    let remarks = if rng.chance(0.1) {
        "N/A".to_string()
    } else {
        rng.pick(REMARKS).to_string()
    };
    let absent = format!("{:.1}", rng.next_f64() * 100.0);

    vec![
        sr.to_string(),
        rng.pick(PROGRAMS).to_string(),
        (1 + rng.below(8)).to_string(),
        status.to_string(),
        reason.to_string(),
        week.to_string(),
        balance_cell(rng),
        follow_ups.to_string(),
        date.format("%Y-%m-%d").to_string(),
        rng.pick(STAFF).to_string(),
        remarks,
        absent.clone(),
        absent,
    ]
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut rng = SimpleRng::new(cli.seed);
    let start = NaiveDate::from_ymd_opt(2024, 2, 5).context("invalid semester start")?;

    let file = std::fs::File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record([
        "Sr Number",
        "Program",
        "No of Semester",
        "Status",
        "Reason",
        "Week",
        "Balance",
        "No of Follow Up",
        "Follow Up Date",
        "Follow Up By",
        "Remarks",
        "Accumulative Absent Percent 80 Percent",
        "Current Week Absent Percent",
    ])?;
    for sr in 1..=cli.records {
        writer.write_record(record(&mut rng, sr, start))?;
    }
    writer.flush()?;

    println!("Wrote {} follow-up records to {}", cli.records, cli.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_use_thousands_separators() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(45_000), "45,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn records_match_the_header_width() {
        let mut rng = SimpleRng::new(7);
        let start = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        for sr in 1..=50 {
            assert_eq!(record(&mut rng, sr, start).len(), 13);
        }
    }
}
