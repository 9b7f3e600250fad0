pub mod embedding;
pub mod evaluation;
pub mod normalizer;
pub mod ocr;
pub mod scoring;
pub mod storage;
