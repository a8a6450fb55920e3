//! NTLM negotiation for portals that challenge for it
//!
//! The handshake is three requests on the same session: a negotiate token,
//! a 401 carrying the server's challenge, and an authenticate token computed
//! from that challenge and the user's credentials. Token encoding is left to
//! `ntlmclient`; this module only deals with header plumbing and credentials.

use crate::error::{ProtocolError, Result};
use base64::prelude::*;
use reqwest::header::{HeaderMap, WWW_AUTHENTICATE};

/// Workstation name reported during negotiation
const WORKSTATION: &str = "COGNOS-DL";

/// The scheme name a server used to offer NTLM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthScheme {
    /// `WWW-Authenticate: NTLM`
    Ntlm,
    /// `WWW-Authenticate: Negotiate`, which accepts raw NTLM tokens
    Negotiate,
}

impl AuthScheme {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AuthScheme::Ntlm => "NTLM",
            AuthScheme::Negotiate => "Negotiate",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("NTLM") {
            Some(AuthScheme::Ntlm)
        } else if token.eq_ignore_ascii_case("Negotiate") {
            Some(AuthScheme::Negotiate)
        } else {
            None
        }
    }

    /// `Authorization` header value carrying `message`
    pub(crate) fn header_value(self, message: &str) -> String {
        format!("{} {}", self.as_str(), message)
    }
}

/// The NTLM-capable scheme offered by a 401 response, preferring plain NTLM
pub(crate) fn offered_scheme(headers: &HeaderMap) -> Option<AuthScheme> {
    let offered: Vec<AuthScheme> = headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split_whitespace().next())
        .filter_map(AuthScheme::parse)
        .collect();

    if offered.contains(&AuthScheme::Ntlm) {
        Some(AuthScheme::Ntlm)
    } else {
        offered.into_iter().next()
    }
}

/// The base64 challenge token a server sent back for `scheme`
pub(crate) fn challenge_token(headers: &HeaderMap, scheme: AuthScheme) -> Option<String> {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            let mut parts = value.split_whitespace();
            let name = parts.next()?;
            let token = parts.next()?;
            (AuthScheme::parse(name) == Some(scheme)).then(|| token.to_string())
        })
}

/// Split `DOMAIN\user` into its domain and user parts
pub(crate) fn split_domain(username: &str) -> (&str, &str) {
    match username.split_once('\\') {
        Some((domain, user)) => (domain, user),
        None => ("", username),
    }
}

/// Base64 negotiate (type 1) message
pub(crate) fn negotiate_message() -> Result<String> {
    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE
        | ntlmclient::Flags::REQUEST_TARGET
        | ntlmclient::Flags::NEGOTIATE_NTLM
        | ntlmclient::Flags::NEGOTIATE_WORKSTATION_SUPPLIED;
    let message = ntlmclient::Message::Negotiate(ntlmclient::NegotiateMessage {
        flags,
        supplied_domain: String::new(),
        supplied_workstation: WORKSTATION.to_owned(),
        os_version: Default::default(),
    });
    let bytes = message
        .to_bytes()
        .map_err(|_| ProtocolError::NtlmHandshake {
            reason: "cannot encode negotiate message",
        })?;
    Ok(BASE64_STANDARD.encode(bytes))
}

/// Base64 authenticate (type 3) message answering a base64 challenge
pub(crate) fn authenticate_message(
    challenge: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let challenge_bytes =
        BASE64_STANDARD
            .decode(challenge)
            .map_err(|_| ProtocolError::NtlmHandshake {
                reason: "challenge is not valid base64",
            })?;
    let challenge = match ntlmclient::Message::try_from(challenge_bytes.as_slice()) {
        Ok(ntlmclient::Message::Challenge(challenge)) => challenge,
        Ok(_) => {
            return Err(ProtocolError::NtlmHandshake {
                reason: "server sent a message that is not a challenge",
            }
            .into());
        }
        Err(_) => {
            return Err(ProtocolError::NtlmHandshake {
                reason: "cannot decode challenge message",
            }
            .into());
        }
    };

    let target_info: Vec<u8> = challenge
        .target_information
        .iter()
        .flat_map(|entry| entry.to_bytes())
        .collect();

    let (domain, user) = split_domain(username);
    let credentials = ntlmclient::Credentials {
        username: user.to_owned(),
        password: password.to_owned(),
        domain: domain.to_owned(),
    };
    let response = ntlmclient::respond_challenge_ntlm_v2(
        challenge.challenge,
        &target_info,
        ntlmclient::get_ntlm_time(),
        &credentials,
    );

    let flags = ntlmclient::Flags::NEGOTIATE_UNICODE | ntlmclient::Flags::NEGOTIATE_NTLM;
    let bytes = response
        .to_message(&credentials, WORKSTATION, flags)
        .to_bytes()
        .map_err(|_| ProtocolError::NtlmHandshake {
            reason: "cannot encode authenticate message",
        })?;
    Ok(BASE64_STANDARD.encode(bytes))
}
