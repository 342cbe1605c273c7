pub mod blueprint_service;
pub mod eval_service;
pub mod generation_service;
pub mod insight_service;
pub mod normalizer;
pub mod provider;
pub mod sandbox;
pub mod scoring_service;
pub mod storage;
