/// Average value per transaction. Returns 0.0 when `count` is zero.
pub fn average(amount: f64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    amount / count as f64
}
