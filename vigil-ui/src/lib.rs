//! Thin CSR shell over the vigil stores: login gate, incident list with
//! filters, analytics panel, and the 30 s refresh loop. Presentation only;
//! all session and sync behavior lives in `vigil-core`.

pub mod app;
