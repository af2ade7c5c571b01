pub mod ai_draft;
pub mod domain;
pub mod editor;
pub mod membership;
pub mod payloads;
pub mod ports;
pub mod progress;
pub mod proxy;
pub mod views;

#[cfg(test)]
mod testing;

pub use ai_draft::{decode_ai_payload, generate_draft, AiDraft, AiPayloadError};
pub use domain::{
    ChallengeDifficulty, CodeSnippet, Difficulty, LessonChallenge, LessonFolder, LessonPlan,
    LessonProject, LessonStep, ProficiencyLevel, ProgressStatus, SkillLevel, Student,
    StudentGroup, StudentLanguage, StudentProgress,
};
pub use editor::{EditorMode, LessonEditor, SubmitOutcome};
pub use membership::{diff_membership, reconcile_folder_membership, FolderForm, MembershipChange};
pub use ports::{
    ClientError, ClientResult, LessonGenerationService, LessonPlannerApi, LessonPlannerRepository,
    PortError, PortResult,
};
pub use proxy::rewrite_proxy_path;
