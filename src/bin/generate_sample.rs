//! Writes a deterministic `matched_books` CSV in the source schema.
//!
//! Usage: `generate_sample [OUTPUT] [ROWS]`

use anyhow::{Context, Result};

const ADJECTIVES: [&str; 8] = [
    "Silent", "Crimson", "Lost", "Hidden", "Last", "Broken", "Golden", "Distant",
];
const NOUNS: [&str; 8] = [
    "Garden", "Kingdom", "River", "Letters", "Empire", "Orchard", "Harbor", "Machine",
];
const AUTHORS: [&str; 6] = [
    "J.R.R. Tolkien",
    "Jane Austen",
    "Frank Herbert",
    "Toni Morrison",
    "Haruki Murakami",
    "Ursula K. Le Guin",
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
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Mostly plausible prices, with the gaps and typos real exports contain.
fn price_cell(rng: &mut SimpleRng) -> String {
    let roll = rng.next_f64();
    if roll < 0.15 {
        String::new()
    } else if roll < 0.18 {
        "0".to_string()
    } else if roll < 0.20 {
        format!("{:.2}", 500.0 + rng.next_f64() * 1500.0)
    } else {
        format!("{:.2}", (rng.gauss(15.0, 8.0)).clamp(1.0, 120.0))
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output_path = args
        .next()
        .unwrap_or_else(|| "matched_books_sample.csv".to_string());
    let rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid row count '{n}'"))?,
        None => 500,
    };

    let mut rng = SimpleRng::new(42);
    let mut writer = csv::Writer::from_path(&output_path)
        .with_context(|| format!("creating {output_path}"))?;

    writer.write_record([
        "title",
        "authors_goodreads",
        "goodreads_rating_norm",
        "amazon_rating_norm",
        "rating_difference",
        "is_outlier",
        "price_avg",
    ])?;

    let mut outliers = 0;
    for i in 0..rows {
        let title = format!(
            "The {} {} {}",
            rng.pick(&ADJECTIVES),
            rng.pick(&NOUNS),
            i + 1
        );
        let author = rng.pick(&AUTHORS);

        let goodreads = rng.gauss(7.8, 0.8).clamp(0.0, 10.0);
        // Amazon skews higher, with an occasional large disagreement.
        let spread = if rng.next_f64() < 0.08 { 3.0 } else { 0.6 };
        let amazon = rng.gauss(goodreads + 0.4, spread).clamp(0.0, 10.0);
        let difference = (amazon - goodreads).abs();
        let is_outlier = difference > 2.0;
        outliers += usize::from(is_outlier);

        writer.write_record([
            title,
            author.to_string(),
            format!("{goodreads:.2}"),
            format!("{amazon:.2}"),
            format!("{difference:.2}"),
            if is_outlier { "True" } else { "False" }.to_string(),
            price_cell(&mut rng),
        ])?;
    }
    writer.flush().context("flushing CSV")?;

    log::info!("{outliers} of {rows} sample books are outliers");
    println!("Wrote {rows} books to {output_path}");
    Ok(())
}
