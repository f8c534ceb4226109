/// Number of distinct voters needed to pass a vote.
/// `ratio` must be in (0, 1].
pub fn required_votes(eligible: usize, ratio: f64) -> usize {
    let n = (eligible as f64 * ratio).ceil() as usize;
    n.max(1)
}
