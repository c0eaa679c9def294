/// Warmup state tracker
///
/// Bar index `i` is scored only once `i >= warmup_bars`, so the tracker is
/// warm exactly when `warmup_bars` bars have been committed before the bar
/// being evaluated.
#[derive(Debug, Clone)]
pub struct WarmupState {
    warmup_bars: usize,
    bars_processed: usize,
}

impl WarmupState {
    pub fn new(warmup_bars: usize) -> Self {
        Self {
            warmup_bars,
            bars_processed: 0,
        }
    }

    /// Warmup from the scoring indicators' lookbacks (max across all).
    pub fn from_lookbacks(lookbacks: impl IntoIterator<Item = usize>) -> Self {
        Self::new(lookbacks.into_iter().max().unwrap_or(0))
    }

    pub fn warmup_bars(&self) -> usize {
        self.warmup_bars
    }

    pub fn process_bar(&mut self) {
        self.bars_processed += 1;
    }

    /// Whether the next bar to be evaluated is past the warmup.
    pub fn is_warm(&self) -> bool {
        self.bars_processed >= self.warmup_bars
    }

    pub fn bars_until_warm(&self) -> usize {
        self.warmup_bars.saturating_sub(self.bars_processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warmup_state() {
        let mut warmup = WarmupState::new(20);
        assert!(!warmup.is_warm());
        assert_eq!(warmup.bars_until_warm(), 20);

        for _ in 0..19 {
            warmup.process_bar();
        }
        assert!(!warmup.is_warm());
        assert_eq!(warmup.bars_until_warm(), 1);

        warmup.process_bar();
        assert!(warmup.is_warm());
        assert_eq!(warmup.bars_until_warm(), 0);

        warmup.process_bar();
        assert_eq!(warmup.bars_until_warm(), 0);
    }

    #[test]
    fn test_zero_warmup() {
        let warmup = WarmupState::new(0);
        assert!(warmup.is_warm());
        assert_eq!(warmup.bars_until_warm(), 0);
    }

    #[test]
    fn test_from_lookbacks() {
        let warmup = WarmupState::from_lookbacks([14, 34, 35, 21, 14]);
        assert_eq!(warmup.warmup_bars(), 35);
        assert_eq!(warmup.bars_until_warm(), 35);
    }

    #[test]
    fn test_from_empty_lookbacks() {
        let warmup = WarmupState::from_lookbacks(std::iter::empty());
        assert_eq!(warmup.bars_until_warm(), 0);
        assert!(warmup.is_warm());
    }
}
