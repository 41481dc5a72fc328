//! # Web Front Door
//!
//! Interfaccia HTTP per convertire un singolo video caricato dal browser.
//!
//! ## Responsabilità:
//! - `GET /`: pagina HTML con il form di upload
//! - `GET /api/formats`: formati supportati e formato di default
//! - `POST /api/convert`: upload multipart, conversione, download del risultato
//!
//! Gli errori vengono restituiti come JSON `{"error": "..."}`.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
