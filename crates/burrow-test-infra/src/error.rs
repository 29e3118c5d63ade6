use testcontainers::TestcontainersError;
use thiserror::Error;

/// Errors raised while provisioning container fixtures.
#[derive(Debug, Error)]
pub enum TestInfraError {
    /// The image could not be pulled or the server never logged readiness.
    #[error("failed to start {image} container: {source}")]
    Startup {
        image: &'static str,
        #[source]
        source: TestcontainersError,
    },

    /// A running container could not report its host or mapped port.
    #[error("failed to inspect container: {0}")]
    Container(#[from] TestcontainersError),

    #[error("failed to connect to redis fixture: {0}")]
    Redis(#[from] redis::RedisError),
}

impl TestInfraError {
    pub(crate) fn startup(image: &'static str) -> impl FnOnce(TestcontainersError) -> Self {
        move |source| Self::Startup { image, source }
    }
}

pub type Result<T, E = TestInfraError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_error_names_the_image() {
        let err = TestInfraError::startup("postgres:17-alpine")(TestcontainersError::other(
            "no docker daemon",
        ));

        assert!(matches!(err, TestInfraError::Startup { image: "postgres:17-alpine", .. }));
        assert!(err
            .to_string()
            .starts_with("failed to start postgres:17-alpine container"));
    }
}
