//! Translation between `Request` values and wire-level HTTP data.
//!
//! # Design
//! `build` turns a `Request` into an `HttpRequest` and `check_status` maps
//! the returned `HttpResponse` back to bytes or a `RequestError`. Neither
//! performs I/O; the coordinator hands the built request to a `Transport`
//! in between.

use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart;
use crate::request::{Headers, Request};

const JSON: &str = "application/json";

pub fn build(request: &Request) -> HttpRequest {
    match request {
        Request::Get { endpoint, headers } => {
            let mut list = header_list(headers);
            set_header(&mut list, "Cache-Control", "no-cache");
            HttpRequest {
                method: HttpMethod::Get,
                url: endpoint.clone(),
                headers: list,
                body: None,
            }
        }
        Request::Post { endpoint, headers, body } => HttpRequest {
            method: HttpMethod::Post,
            url: endpoint.clone(),
            headers: with_json_default(headers),
            body: Some(body.clone()),
        },
        Request::Rest {
            method,
            endpoint,
            headers,
            body,
        } => HttpRequest {
            method: *method,
            url: endpoint.clone(),
            headers: with_json_default(headers),
            body: body.clone(),
        },
        Request::Upload {
            endpoint,
            headers,
            params,
            files,
        } => {
            let boundary = multipart::generate_boundary();
            let mut list = header_list(headers);
            set_header(&mut list, "Content-Type", &multipart::content_type(&boundary));
            HttpRequest {
                method: HttpMethod::Post,
                url: endpoint.clone(),
                headers: list,
                body: Some(multipart::encode(&boundary, params, files)),
            }
        }
    }
}

/// Only an exact 200 counts as success.
pub fn check_status(request: &Request, response: HttpResponse) -> Result<Vec<u8>, RequestError> {
    if response.status == 200 {
        return Ok(response.body);
    }
    if matches!(request, Request::Get { .. }) {
        return Err(RequestError::InvalidResponse);
    }
    let code = if (100..=599).contains(&response.status) {
        response.status
    } else {
        500
    };
    Err(RequestError::ServerError(code))
}

fn header_list(headers: &Headers) -> Vec<(String, String)> {
    headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn with_json_default(headers: &Headers) -> Vec<(String, String)> {
    let mut list = header_list(headers);
    if !list.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
        list.push(("Content-Type".to_string(), JSON.to_string()));
    }
    list
}

/// Replace any existing header of that name (any case) with `value`.
fn set_header(list: &mut Vec<(String, String)>, name: &str, value: &str) {
    list.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    list.push((name.to_string(), value.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::FileAttachment;

    const URL: &str = "http://localhost:3000/items";

    #[test]
    fn get_always_bypasses_caches() {
        let req = build(&Request::get(URL).with_header("cache-control", "max-age=60"));
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.header("Cache-Control"), Some("no-cache"));
        assert_eq!(req.headers.len(), 1);
        assert!(req.body.is_none());
    }

    #[test]
    fn post_defaults_to_json() {
        let req = build(&Request::post(URL, b"{}".to_vec()));
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some(JSON));
        assert_eq!(req.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn explicit_content_type_wins() {
        let req = build(&Request::put(URL, b"x".to_vec()).with_header("content-type", "text/plain"));
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.headers, vec![("content-type".to_string(), "text/plain".to_string())]);
    }

    #[test]
    fn delete_without_body() {
        let req = build(&Request::delete(URL));
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn upload_body_uses_announced_boundary() {
        let req = build(
            &Request::upload(URL)
                .with_param("a", "1")
                .with_file(FileAttachment::new("f.txt", "text/plain", b"hi".to_vec())),
        );
        assert_eq!(req.method, HttpMethod::Post);
        let content_type = req.header("content-type").unwrap().to_string();
        let boundary = content_type.strip_prefix("multipart/form-data; boundary=").unwrap();
        let body = String::from_utf8(req.body.unwrap()).unwrap();
        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn success_is_exactly_200() {
        let ok = check_status(&Request::get(URL), HttpResponse::new(200, b"body".to_vec()));
        assert_eq!(ok.unwrap(), b"body");
        let created = check_status(&Request::post(URL, Vec::new()), HttpResponse::new(201, Vec::new()));
        assert_eq!(created.unwrap_err(), RequestError::ServerError(201));
    }

    #[test]
    fn get_failure_is_invalid_response() {
        let err = check_status(&Request::get(URL), HttpResponse::new(404, Vec::new())).unwrap_err();
        assert_eq!(err, RequestError::InvalidResponse);
    }

    #[test]
    fn rest_failure_carries_status() {
        let err = check_status(&Request::delete(URL), HttpResponse::new(409, Vec::new())).unwrap_err();
        assert_eq!(err, RequestError::ServerError(409));
    }

    #[test]
    fn unknown_status_defaults_to_500() {
        let err = check_status(&Request::post(URL, Vec::new()), HttpResponse::new(0, Vec::new())).unwrap_err();
        assert_eq!(err, RequestError::ServerError(500));
    }
}
