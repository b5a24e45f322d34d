// Elascope — JPEG recompression-error visualization for images and video
// Copyright (c) 2026 The Elascope Authors
//
// The core chain (recompress -> diff -> normalize -> composite) lives in
// `analysis`; `video` fans it out over a video's frames in order and
// reassembles a playable file; `batch` is the path-dispatch surface the
// CLI sits on.

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod video;
