use std::collections::HashMap;

use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};

use crate::error::{ApiError, ApiResult};
use crate::service::Upload;

/// `Json` whose rejection renders as an [`ApiError`] body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// A fully buffered multipart form: text fields by name, files in arrival
/// order tagged with their field name.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: Vec<(String, Upload)>,
}

impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Self::read(multipart).await
    }
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?;
                    // Browsers submit an empty, unnamed part for an untouched file input.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.files.push((name, Upload { file_name, bytes }));
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Take every file sent under `name`. Files under any other field name
    /// are rejected.
    pub fn take_files(&mut self, name: &str) -> ApiResult<Vec<Upload>> {
        if let Some((unexpected, _)) = self.files.iter().find(|(field, _)| field != name) {
            return Err(ApiError::MalformedBody(format!("unexpected file field {unexpected:?}")));
        }
        Ok(std::mem::take(&mut self.files)
            .into_iter()
            .map(|(_, upload)| upload)
            .collect())
    }
}
