pub mod db;
pub mod lesson_llm;
pub mod memory;

pub use db::DbAdapter;
pub use lesson_llm::OpenAiLessonAdapter;
pub use memory::MemoryAdapter;
