pub mod places;
pub mod publish;

pub use places::PlacesApi;
pub use publish::PublishApi;
