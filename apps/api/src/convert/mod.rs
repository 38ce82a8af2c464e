// Conversion endpoints: text → PDF, images → PDF, and PDF merging.
// Each handler collects the multipart upload, then hands the CPU-bound work to spawn_blocking.

pub mod handlers;
pub mod upload;
