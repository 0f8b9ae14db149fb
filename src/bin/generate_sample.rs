use std::fs;

/// Emitters in the sample: (id, label, centre frequency MHz, spread MHz, mean amplitude dB).
const EMITTERS: [(i64, &str, f64, f64, f64); 5] = [
    (-1, "Noise Source", 1500.0, 900.0, -95.0),
    (0, "Unknown Emitter", 2400.0, 40.0, -70.0),
    (1, "Alpha Emitter", 3100.0, 15.0, -55.0),
    (2, "Bravo Radar", 9400.0, 25.0, -40.0),
    (3, "Charlie Link", 5800.0, 10.0, -62.0),
];

const ROWS: usize = 5_000;

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let csv_path = "sample_emitters.csv";
    let mut writer = csv::Writer::from_path(csv_path).expect("Failed to create output file");
    writer
        .write_record(["time_s", "frequency_mhz", "amplitude_db", "pulse_width_us", "emitter_id"])
        .expect("Failed to write header");

    let mut time = 0.0;
    for i in 0..ROWS {
        time += rng.next_f64() * 0.01;

        let (id, _, centre, spread, level) = EMITTERS[rng.below(EMITTERS.len())];
        let frequency = rng.gauss(centre, spread);
        let amplitude = rng.gauss(level, 3.0);
        let pulse_width = if id < 0 { 0.0 } else { rng.gauss(1.0 + id as f64, 0.2).max(0.05) };

        // A few damaged rows so the viewer's fallbacks show up.
        let emitter = match i % 997 {
            0 => String::new(),
            500 => "n/a".to_string(),
            _ => id.to_string(),
        };
        let amplitude = if i % 1231 == 7 { "--".to_string() } else { format!("{amplitude:.2}") };

        writer
            .write_record([
                format!("{time:.4}"),
                format!("{frequency:.3}"),
                amplitude,
                format!("{pulse_width:.3}"),
                emitter,
            ])
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");

    let reference_path = "reference_emitters.txt";
    let mut reference = String::new();
    for (id, label, ..) in EMITTERS {
        reference.push_str(&format!("{label}={id}\n"));
    }
    fs::write(reference_path, reference).expect("Failed to write reference labels");

    println!(
        "Wrote {ROWS} detections from {} emitters to {csv_path} and labels to {reference_path}",
        EMITTERS.len()
    );
}
