use anyhow::anyhow;
use log::info;
use rouille::{Request, Response};
use std::sync::{Arc, Mutex};

use crate::{
    catalog::CatalogClient,
    config::HttpConfig,
    domain::quiz::{NewQuiz, QuizId},
    http::error::ApiError,
    storage::{QuizStore, error::StorageError, operations::SqliteStore},
};

const DEFAULT_SEARCH_LIMIT: usize = 25;

pub type SharedCatalog = Arc<dyn CatalogClient + Send + Sync>;

pub struct HttpServer {
    store: Arc<Mutex<SqliteStore>>,
    catalog: SharedCatalog,
    pub config: HttpConfig,
}

impl HttpServer {
    pub fn new(store: SqliteStore, catalog: SharedCatalog, config: HttpConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            catalog,
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let result = rouille::router!(request,
            (GET) (/quizzes) => {
                self.list_quizzes()
            },
            (POST) (/quizzes) => {
                self.create_quiz(request)
            },
            (GET) (/quizzes/{id: String}) => {
                self.get_quiz(id)
            },
            (DELETE) (/quizzes/{id: String}) => {
                self.delete_quiz(id)
            },
            (GET) (/catalog/track/{id: String}) => {
                self.lookup_track(id)
            },
            (GET) (/catalog/search-track) => {
                self.search_track(request)
            },
            (GET) (/catalog/search) => {
                self.search(request)
            },
            _ => Ok(Response::empty_404())
        );

        let response = result.unwrap_or_else(ApiError::into_response);
        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    /// runs `f` with the locked store
    fn with_store<T>(
        &self,
        f: impl FnOnce(&mut SqliteStore) -> Result<T, StorageError>,
    ) -> Result<T, ApiError> {
        let mut store = self.store.lock().map_err(|e| {
            StorageError::Internal(anyhow!("Could not access quiz store under lock: {e}"))
        })?;
        Ok(f(&mut store)?)
    }

    fn list_quizzes(&self) -> Result<Response, ApiError> {
        let quizzes = self.with_store(|store| store.list_quizzes())?;
        Ok(Response::json(&quizzes))
    }

    fn get_quiz(&self, id: String) -> Result<Response, ApiError> {
        let quiz = self.with_store(|store| store.get_quiz(&QuizId(id)))?;
        Ok(Response::json(&quiz))
    }

    fn create_quiz(&self, request: &Request) -> Result<Response, ApiError> {
        let new_quiz: NewQuiz = rouille::input::json_input(request)
            .map_err(|e| ApiError::BadRequest(format!("invalid quiz document: {e}")))?;

        let quiz = self.with_store(|store| store.insert_quiz(new_quiz))?;
        Ok(Response::json(&quiz).with_status_code(201))
    }

    fn delete_quiz(&self, id: String) -> Result<Response, ApiError> {
        self.with_store(|store| store.delete_quiz(&QuizId(id)))?;
        Ok(Response::empty_204())
    }

    fn lookup_track(&self, id: String) -> Result<Response, ApiError> {
        let track = self
            .catalog
            .lookup_by_id(&crate::domain::track::CatalogId(id))?;
        Ok(Response::json(&track))
    }

    fn search_track(&self, request: &Request) -> Result<Response, ApiError> {
        let present = |name: &str| request.get_param(name).filter(|s| !s.trim().is_empty());
        let (Some(title), Some(artist)) = (present("title"), present("artist")) else {
            return Err(ApiError::BadRequest(
                "title and artist parameters are required".into(),
            ));
        };
        let album = request.get_param("album").filter(|a| !a.is_empty());

        let track = self
            .catalog
            .search_by_metadata(&title, &artist, album.as_deref())?;
        Ok(Response::json(&track))
    }

    fn search(&self, request: &Request) -> Result<Response, ApiError> {
        let Some(query) = request.get_param("q").filter(|q| !q.trim().is_empty()) else {
            return Err(ApiError::BadRequest("missing search query".into()));
        };
        let limit = match request.get_param("limit") {
            Some(limit) => limit
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("invalid limit {limit}")))?,
            None => DEFAULT_SEARCH_LIMIT,
        };

        let tracks = self.catalog.search(&query, limit)?;
        Ok(Response::json(&tracks))
    }
}

#[cfg(test)]
pub fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: rouille::Response,
) -> anyhow::Result<T> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
