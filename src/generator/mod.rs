/// Pure derivation of output paths from a definition's directory convention.
pub mod path_planner;
/// Generation run: query execution, mapping, context building and rendering.
pub mod pipeline;

pub use path_planner::{plan, ArtifactKind, PathConvention, PathSet};
pub use pipeline::{
    run, Artifact, ArtifactContent, ArtifactOutcome, GenerationReport, GenerationRequest,
    QueryOutcome,
};
