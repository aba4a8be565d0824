use crate::backend::QueryBackend;
use crate::errors::HarnessError;

/// The only process-fatal check: the backend client must be usable.
pub async fn check(backend: &dyn QueryBackend) -> Result<(), HarnessError> {
    backend.preflight().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;

    #[tokio::test]
    async fn test_check_passes_through() {
        assert!(check(&FakeBackend::new()).await.is_ok());
        let err = check(&FakeBackend::new().failing_preflight("bq: command not found"))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("command not found"));
    }
}
