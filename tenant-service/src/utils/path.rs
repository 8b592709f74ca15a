/// Upper bound, in bytes, for a path echoed into a `Location` header.
pub const MAX_REDIRECT_PATH_LENGTH: usize = 2048;

/// Makes a request path safe to append to a redirect URL.
///
/// Blank input becomes `/`; a leading `/` is enforced; ASCII control bytes
/// (0x00-0x1F, 0x7F) are dropped; the result is cut to at most
/// [`MAX_REDIRECT_PATH_LENGTH`] bytes on a character boundary. `..` segments
/// are left alone: the output only ever becomes the path of an off-host URL.
pub fn sanitize_path(path: &str) -> String {
    if path.trim().is_empty() {
        return "/".to_string();
    }

    let mut sanitized = String::with_capacity(path.len().min(MAX_REDIRECT_PATH_LENGTH) + 1);
    if !path.starts_with('/') {
        sanitized.push('/');
    }
    sanitized.extend(path.chars().filter(|c| !c.is_ascii_control()));

    if sanitized.len() > MAX_REDIRECT_PATH_LENGTH {
        let mut cut = MAX_REDIRECT_PATH_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }

    sanitized
}
