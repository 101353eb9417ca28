pub mod audit;
pub mod demo;
pub mod dispatcher;
pub mod error;
pub mod interpret;
pub mod llm;
pub mod model;
pub mod notify;
pub mod paths;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod scene;
pub mod settings;
pub mod speech;
pub mod state;
pub mod util;
