use skua_session::SessionError;
use skua_stanza::StanzaError;

#[derive(Debug, thiserror::Error)]
pub enum MucError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Stanza(#[from] StanzaError),
}
