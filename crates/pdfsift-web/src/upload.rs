use axum::extract::Multipart;
use axum::http::StatusCode;
use pdfsift_core::looks_like_pdf;

use crate::models::ApiError;

/// A PDF pulled out of a multipart upload.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Content types accepted for the file field; browsers and curl send either.
const ACCEPTED_CONTENT_TYPES: &[&str] = &["application/pdf", "application/octet-stream"];

/// Parse a multipart form upload, taking the file from the `pdf` (or `file`) field.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), format!("Failed to read form field: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "pdf" | "file" => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        ApiError::new(e.status(), format!("Failed to read file data: {}", e.body_text()))
                    })?
                    .to_vec();

                check_pdf(content_type.as_deref(), &data)?;
                file = Some(UploadedFile { filename, data });
            }
            _ => {
                // Ignore unknown fields
                let _ = field.bytes().await;
            }
        }
    }

    file.ok_or_else(|| ApiError::bad_request("No file uploaded"))
}

fn check_pdf(content_type: Option<&str>, data: &[u8]) -> Result<(), ApiError> {
    if let Some(ct) = content_type
        && !ACCEPTED_CONTENT_TYPES.contains(&ct)
    {
        return Err(ApiError::bad_request(format!(
            "Unsupported content type {ct}. Please upload a PDF."
        )));
    }
    if !looks_like_pdf(data) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "File doesn't appear to be a valid PDF",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_pdf_magic_with_either_content_type() {
        assert!(check_pdf(Some("application/pdf"), b"%PDF-1.7\n").is_ok());
        assert!(check_pdf(Some("application/octet-stream"), b"%PDF-1.7\n").is_ok());
        assert!(check_pdf(None, b"%PDF-1.7\n").is_ok());
    }

    #[test]
    fn rejects_wrong_content_type_or_magic() {
        assert!(check_pdf(Some("image/png"), b"%PDF-1.7\n").is_err());
        assert!(check_pdf(Some("application/pdf"), b"PK\x03\x04").is_err());
    }
}
