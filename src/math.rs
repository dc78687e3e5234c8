// Program-long lookup tables and log-space helpers.

/// Phred+33 quality encoding offset.
pub const ASCII_OFFSET: u8 = b'!';

const JACOBIAN_MAX_TOLERANCE: f64 = 8.0;
const JACOBIAN_TABLE_STEP: f64 = 0.0001;
const JACOBIAN_INV_STEP: f64 = 1.0 / JACOBIAN_TABLE_STEP;

lazy_static::lazy_static! {
    /// Base error probability per encoded quality byte: 10^(-(q-33)/10).
    static ref QUAL_TO_ERROR_PROB: [f64; 128] = {
        let mut table = [0.0f64; 128];
        for (q, entry) in table.iter_mut().enumerate().skip(ASCII_OFFSET as usize) {
            *entry = 10f64.powf(-((q as f64 - ASCII_OFFSET as f64) / 10.0));
        }
        table
    };

    /// log10(1 + 10^-x) sampled every 0.0001 over [0, 8].
    static ref JACOBIAN_LOG_TABLE: Vec<f64> = {
        let size = (JACOBIAN_MAX_TOLERANCE * JACOBIAN_INV_STEP) as usize + 1;
        (0..size)
            .map(|k| (1.0 + 10f64.powf(-JACOBIAN_TABLE_STEP * k as f64)).log10())
            .collect()
    };
}

pub fn qual_to_error_prob(qual: u8) -> f64 {
    QUAL_TO_ERROR_PROB[usize::from(qual.min(127))]
}

/// Approximate log10(10^a + 10^b) through the tabulated correction term.
/// When the operands differ by more than 8 the correction is dropped.
pub fn approximate_log10_sum_log10(a: f64, b: f64) -> f64 {
    let (small, big) = if a > b { (b, a) } else { (a, b) };
    let diff = big - small;
    if diff < JACOBIAN_MAX_TOLERANCE {
        big + JACOBIAN_LOG_TABLE[(diff * JACOBIAN_INV_STEP).round() as usize]
    } else {
        big
    }
}
