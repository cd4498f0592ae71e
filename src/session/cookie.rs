// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session-cookie mending.
//!
//! The portal issues its authentication cookie with an expiry attribute
//! that standard cookie stores cannot parse. An unmended cookie is silently
//! dropped and every later call comes back unauthorized, so the expiry
//! attribute is blanked on every response before the cookie is committed to
//! the shared jar.

use reqwest::Url;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, SET_COOKIE};

/// Name of the portal's session authentication cookie.
pub(crate) const AUTH_COOKIE: &str = ".ASPXAUTH_TRUEHOME";

/// Blanks the expiry attribute of the auth cookie.
///
/// Returns the mended `Set-Cookie` string for the auth cookie, or `None`
/// for any other cookie. The value and all other attributes pass through
/// unchanged; the attribute name match is ASCII-case-insensitive.
pub(crate) fn mend_set_cookie(raw: &str) -> Option<String> {
    let mut segments = raw.split(';');
    let pair = segments.next()?;
    let (name, _) = pair.split_once('=')?;
    if name.trim() != AUTH_COOKIE {
        return None;
    }

    let mut mended = pair.trim().to_string();
    for segment in segments {
        let attr = segment.split_once('=').map_or(segment, |(attr, _)| attr);
        if attr.trim().eq_ignore_ascii_case("expires") {
            mended.push_str("; expires=");
        } else {
            mended.push_str("; ");
            mended.push_str(segment.trim());
        }
    }
    Some(mended)
}

/// Commits the mended auth cookie from a response into the jar.
///
/// Called on every portal response, login included. Cookies other than the
/// auth cookie are left to the jar's own handling.
pub(crate) fn mend_response_cookies(jar: &Jar, url: &Url, headers: &HeaderMap) {
    for header in headers.get_all(SET_COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        if let Some(mended) = mend_set_cookie(raw) {
            tracing::trace!(cookie = AUTH_COOKIE, "mended session cookie expiry");
            jar.add_cookie_str(&mended, url);
        }
    }
}

/// Reads the auth cookie's value from a response's `Set-Cookie` headers.
///
/// Returns `Some` with the (possibly empty) value when the response carries
/// the auth cookie, `None` otherwise. Login uses this to spot the portal's
/// empty-cookie way of saying the credentials were bad.
pub(crate) fn auth_cookie_value(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(SET_COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        let Some((name, rest)) = raw.split_once('=') else {
            continue;
        };
        if name.trim() == AUTH_COOKIE {
            let value = rest.split(';').next().unwrap_or("").trim();
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn mend_blanks_expires() {
        let raw = ".ASPXAUTH_TRUEHOME=abc123; expires=/Date(1736463000)/; path=/; HttpOnly";
        let mended = mend_set_cookie(raw).unwrap();
        assert_eq!(
            mended,
            ".ASPXAUTH_TRUEHOME=abc123; expires=; path=/; HttpOnly"
        );
    }

    #[test]
    fn mend_is_case_insensitive_on_attribute() {
        let raw = ".ASPXAUTH_TRUEHOME=abc; Expires=garbage; Path=/";
        let mended = mend_set_cookie(raw).unwrap();
        assert_eq!(mended, ".ASPXAUTH_TRUEHOME=abc; expires=; Path=/");
    }

    #[test]
    fn mend_ignores_other_cookies() {
        assert_eq!(mend_set_cookie("session=xyz; expires=garbage"), None);
    }

    #[test]
    fn mend_keeps_value_and_attributes() {
        let raw = ".ASPXAUTH_TRUEHOME=a=b=c; path=/; Secure";
        let mended = mend_set_cookie(raw).unwrap();
        assert_eq!(mended, ".ASPXAUTH_TRUEHOME=a=b=c; path=/; Secure");
    }

    #[test]
    fn auth_cookie_value_present() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static(".ASPXAUTH_TRUEHOME=token99; path=/"),
        );
        assert_eq!(auth_cookie_value(&headers), Some("token99".to_string()));
    }

    #[test]
    fn auth_cookie_value_empty() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("other=1; path=/"),
        );
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static(".ASPXAUTH_TRUEHOME=; path=/"),
        );
        assert_eq!(auth_cookie_value(&headers), Some(String::new()));
    }

    #[test]
    fn auth_cookie_value_absent() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("other=1"));
        assert_eq!(auth_cookie_value(&headers), None);
    }
}
