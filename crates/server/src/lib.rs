use std::sync::Arc;

use db::DBService;
use services::services::{analysis::ProjectAnalyzer, inference::CompletionModel};

pub mod error;
pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    db: DBService,
    analyzer: Arc<ProjectAnalyzer>,
}

impl AppState {
    pub fn new(db: DBService, model: Arc<dyn CompletionModel>) -> Self {
        let analyzer = Arc::new(ProjectAnalyzer::new(db.clone(), model));
        Self { db, analyzer }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn analyzer(&self) -> &ProjectAnalyzer {
        &self.analyzer
    }
}
