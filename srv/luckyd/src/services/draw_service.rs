use std::collections::HashSet;
use async_trait::async_trait;

use crate::error::{DrawError, DrawResult};
use crate::models::{DrawConfig, DrawResponse};

/// Source of drawn numbers. The reveal scheduler calls `draw` exactly once per draw.
#[async_trait(?Send)]
pub trait DrawService: Send + Sync {
    /// Returns the machine's reply, or `DrawError::Service` when it could not be reached
    /// or its reply could not be read.
    async fn draw(&self, config: &DrawConfig, locked: &[i64]) -> DrawResult<DrawResponse>;
}

impl DrawResponse {
    /// Turn an explicit machine error into a `ServiceError`.
    pub fn into_results(self) -> DrawResult<Vec<i64>> {
        match self.error {
            Some(message) if !message.trim().is_empty() => Err(DrawError::Service(message)),
            _ => Ok(self.results),
        }
    }
}

/// The machine's numbers are not trusted: wrong count, out of range, repeated or
/// already locked numbers are all rejected before anything is revealed.
pub fn validate_results(config: &DrawConfig, locked: &[i64], results: &[i64]) -> DrawResult<()> {
    if results.len() != config.count {
        return Err(DrawError::Service(format!(
            "Draw machine returned {} numbers, expected {}",
            results.len(),
            config.count
        )));
    }

    let locked: HashSet<i64> = locked.iter().copied().collect();
    let mut seen = HashSet::new();
    for &n in results {
        if n < config.min || n > config.max {
            return Err(DrawError::Service(format!(
                "Draw machine returned {} outside [{}, {}]",
                n, config.min, config.max
            )));
        }
        if locked.contains(&n) {
            return Err(DrawError::Service(format!("Draw machine returned locked number {}", n)));
        }
        if !seen.insert(n) {
            return Err(DrawError::Service(format!("Draw machine returned {} twice", n)));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: DrawConfig = DrawConfig { min: 1, max: 10, count: 3 };

    #[test]
    fn test_accepts_well_formed_results() {
        assert!(validate_results(&CONFIG, &[1, 2], &[3, 9, 10]).is_ok());
    }

    #[test]
    fn test_rejects_wrong_count() {
        assert!(validate_results(&CONFIG, &[], &[3, 4]).is_err());
        assert!(validate_results(&CONFIG, &[], &[3, 4, 5, 6]).is_err());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(validate_results(&CONFIG, &[], &[0, 4, 5]).is_err());
        assert!(validate_results(&CONFIG, &[], &[3, 4, 11]).is_err());
    }

    #[test]
    fn test_rejects_locked_and_duplicates() {
        let err = validate_results(&CONFIG, &[4], &[3, 4, 5]).unwrap_err();
        assert_eq!(err, DrawError::Service("Draw machine returned locked number 4".into()));
        let err = validate_results(&CONFIG, &[], &[3, 5, 3]).unwrap_err();
        assert_eq!(err, DrawError::Service("Draw machine returned 3 twice".into()));
    }

    #[test]
    fn test_explicit_error_wins_over_results() {
        let response = DrawResponse { results: vec![1], error: Some("Not enough numbers left".into()) };
        assert_eq!(
            response.into_results().unwrap_err(),
            DrawError::Service("Not enough numbers left".into())
        );

        let response = DrawResponse { results: vec![1, 2], error: Some("  ".into()) };
        assert_eq!(response.into_results().unwrap(), vec![1, 2]);
    }
}
