/// Shared cancel-intent flag for one run.
///
/// Cloning yields a handle to the same flag. Requesting is idempotent and the
/// flag never resets; the token itself aborts nothing, checkpoints decide.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: tokio_util::sync::CancellationToken,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.inner.cancel();
    }

    pub fn is_requested(&self) -> bool {
        self.inner.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_idempotent_and_shared_by_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_requested());

        token.request();
        token.request();
        assert!(observer.is_requested());
        assert!(token.is_requested());
    }

    #[test]
    fn visible_across_threads() {
        let token = CancellationToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.request())
            .join()
            .unwrap();
        assert!(token.is_requested());
    }
}
