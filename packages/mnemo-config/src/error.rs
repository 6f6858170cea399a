pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid listen URL {value:?}.")]
	InvalidListenUrl { value: String },
	#[error("{message}")]
	Validation { message: String },
}
