pub mod assembler;
pub mod collector;
pub mod dispatcher;
pub mod fetcher;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod uploader;
pub mod writer;

pub use assembler::Assembler;
pub use collector::Collector;
pub use dispatcher::Dispatcher;
pub use fetcher::TelegramFetcher;
pub use session::UpdateStream;
pub use uploader::SupabaseUploader;
pub use writer::PgWriter;
