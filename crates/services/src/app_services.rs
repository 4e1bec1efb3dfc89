use std::sync::Arc;

use quiz_api::{
    ApiConfig, AuthoringApi, HttpBackend, IdentityApi, InMemoryBackend, LearnerApi,
};

use crate::authoring::QuizAuthoringService;
use crate::config::RetryPolicy;
use crate::error::AppServicesError;
use crate::identity::IdentityStore;
use crate::notify::Notifier;
use crate::sessions::QuizSessionService;

/// Assembles app-facing services over one backend.
#[derive(Clone)]
pub struct AppServices {
    sessions: Arc<QuizSessionService>,
    authoring: Arc<QuizAuthoringService>,
    identity: Arc<IdentityStore>,
    notifier: Notifier,
}

impl AppServices {
    /// Build services backed by the REST API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn new_http(
        config: ApiConfig,
        policy: RetryPolicy,
        notifier: Notifier,
    ) -> Result<Self, AppServicesError> {
        let backend = Arc::new(HttpBackend::new(config)?);
        Ok(Self::from_backend(backend, policy, notifier))
    }

    /// Build REST-backed services configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the HTTP client cannot be built.
    pub fn from_env(notifier: Notifier) -> Result<Self, AppServicesError> {
        Self::new_http(ApiConfig::from_env(), RetryPolicy::from_env(), notifier)
    }

    /// Build services over an in-memory backend, for demos and tests.
    #[must_use]
    pub fn in_memory(backend: InMemoryBackend, notifier: Notifier) -> Self {
        Self::from_backend(Arc::new(backend), RetryPolicy::no_delay(1), notifier)
    }

    #[must_use]
    pub fn from_backend<B>(backend: Arc<B>, policy: RetryPolicy, notifier: Notifier) -> Self
    where
        B: LearnerApi + AuthoringApi + IdentityApi + 'static,
    {
        let learner: Arc<dyn LearnerApi> = backend.clone();
        let writer: Arc<dyn AuthoringApi> = backend.clone();
        let identity: Arc<dyn IdentityApi> = backend;

        Self {
            sessions: Arc::new(QuizSessionService::new(
                Arc::clone(&learner),
                notifier.clone(),
            )),
            authoring: Arc::new(QuizAuthoringService::new(
                writer,
                learner,
                notifier.clone(),
            )),
            identity: Arc::new(IdentityStore::new(identity, policy)),
            notifier,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn authoring(&self) -> Arc<QuizAuthoringService> {
        Arc::clone(&self.authoring)
    }

    #[must_use]
    pub fn identity(&self) -> Arc<IdentityStore> {
        Arc::clone(&self.identity)
    }

    #[must_use]
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }
}
