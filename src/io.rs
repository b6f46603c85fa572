use std::path::Path;

use crate::asset::AssetError;

#[cfg(target_arch = "wasm32")]
use web_sys::XmlHttpRequest;
#[cfg(target_arch = "wasm32")]
use web_sys::XmlHttpRequestResponseType;

#[cfg(not(target_arch = "wasm32"))]
const READ_CHUNK: usize = 64 * 1024;

/// Turns a local asset path into the relative URL the page serves it under.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn normalize_web_path(path: &Path) -> Result<String, AssetError> {
    let mut path_str = path.to_string_lossy().replace('\\', "/");

    while let Some(stripped) = path_str.strip_prefix("./") {
        path_str = stripped.to_string();
    }

    if let Some(stripped) = path_str.strip_prefix("web/") {
        path_str = stripped.to_string();
    }

    if path_str.starts_with('/') {
        path_str.remove(0);
    }

    if path_str.is_empty() {
        return Err(AssetError::EmptyPath);
    }

    Ok(path_str)
}

#[cfg(target_arch = "wasm32")]
fn fetch_bytes_sync(url: &str) -> Result<Vec<u8>, AssetError> {
    let request_error = |stage: &str, err: wasm_bindgen::JsValue| AssetError::Request {
        url: url.to_string(),
        message: format!("{stage}: {err:?}"),
    };

    let request = XmlHttpRequest::new().map_err(|err| request_error("create", err))?;
    request
        .open_with_async("GET", url, false)
        .map_err(|err| request_error("open", err))?;
    request.set_response_type(XmlHttpRequestResponseType::Arraybuffer);
    request.send().map_err(|err| request_error("send", err))?;

    let status = request
        .status()
        .map_err(|err| request_error("status", err))?;

    if !(200..400).contains(&status) {
        return Err(AssetError::Http {
            url: url.to_string(),
            status,
        });
    }

    let buffer = request
        .response()
        .map_err(|err| request_error("response", err))?;

    if buffer.is_null() || buffer.is_undefined() {
        return Err(AssetError::Request {
            url: url.to_string(),
            message: "no response body".into(),
        });
    }

    let array = js_sys::Uint8Array::new(&buffer);
    let mut bytes = vec![0u8; array.length() as usize];
    array.copy_to(&mut bytes);
    Ok(bytes)
}

/// Reads the whole file, reporting the loaded fraction after every chunk.
#[cfg(not(target_arch = "wasm32"))]
fn read_file_with_progress(
    path: &Path,
    progress: &mut dyn FnMut(f32),
) -> Result<Vec<u8>, AssetError> {
    use std::io::Read;

    let io_error = |err: std::io::Error| AssetError::Io {
        path: path.display().to_string(),
        source: err,
    };

    let mut file = std::fs::File::open(path).map_err(io_error)?;
    let total = file.metadata().map_err(io_error)?.len() as usize;
    let mut bytes = Vec::with_capacity(total);
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let read = file.read(&mut chunk).map_err(io_error)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        if total > 0 {
            progress((bytes.len() as f32 / total as f32).min(1.0));
        }
    }

    if total == 0 {
        progress(1.0);
    }

    Ok(bytes)
}

pub(crate) fn load_binary(
    path: &Path,
    progress: &mut dyn FnMut(f32),
) -> Result<Vec<u8>, AssetError> {
    #[cfg(target_arch = "wasm32")]
    {
        let url = normalize_web_path(path)?;
        let bytes = fetch_bytes_sync(&url)?;
        progress(1.0);
        Ok(bytes)
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        if path.as_os_str().is_empty() {
            return Err(AssetError::EmptyPath);
        }
        read_file_with_progress(path, progress)
    }
}
