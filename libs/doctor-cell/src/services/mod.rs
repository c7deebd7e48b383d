pub mod directory;
pub mod supabase;

pub use directory::{DirectoryLookup, InMemoryDirectory};
pub use supabase::SupabaseDirectory;
