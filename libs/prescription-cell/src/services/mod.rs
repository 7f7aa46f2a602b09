pub mod normalizer;
pub mod owner;
pub mod reader;
pub mod serializer;
pub mod store;
pub mod writer;

pub use normalizer::normalize_medications;
pub use owner::{EntityOwnerLookup, SupabaseOwnerLookup};
pub use reader::PrescriptionReader;
pub use serializer::{serialize_medications, CanonicalJson};
pub use store::{PrescriptionStore, SupabasePrescriptionStore};
pub use writer::PrescriptionWriter;
