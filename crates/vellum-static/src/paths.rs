//! Output path derivation.
//!
//! Source paths and output paths are slash-separated strings. Output paths are
//! relative to the site output root (`blog/first-post.html`), so relative links
//! between pages can be computed without knowing where the site is written.

/// Sanitize one path segment into a lowercase, hyphen-separated ASCII token.
///
/// Uses the same rule as heading ids, so `[[page#Heading]]` fragments land on
/// the rendered heading. The result is stable: sanitizing it again returns
/// it unchanged. A segment with nothing sluggable becomes `untitled`.
///
/// Distinct inputs can collapse to the same segment (`"A B"` and `"a-b"`).
/// Such collisions are accepted; the later page overwrites the earlier one.
pub fn sanitize_segment(name: &str) -> String {
    vellum_md::slugify(name)
}

/// Split a path into its directory (possibly empty) and file name.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// File name without its final extension.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    }
}

/// Lowercased final extension of a file name, if any.
pub fn extension(file_name: &str) -> Option<String> {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => Some(file_name[pos + 1..].to_ascii_lowercase()),
        _ => None,
    }
}

/// Whether a base name marks a folder's landing page.
pub fn is_index_name(base_name: &str) -> bool {
    base_name.eq_ignore_ascii_case("index")
}

fn sanitize_dir(dir: &str) -> String {
    dir.split('/')
        .filter(|segment| !segment.is_empty())
        .map(sanitize_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn join(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

/// Output path of a document.
///
/// Every directory segment is sanitized. The file name is sanitized too,
/// except for index documents which always become `index.html`.
pub fn output_path_for(document_path: &str) -> String {
    let (dir, file) = split_parent(document_path);
    let stem = file_stem(file);

    let name = if is_index_name(stem) {
        "index".to_string()
    } else {
        sanitize_segment(stem)
    };

    join(&sanitize_dir(dir), &format!("{name}.html"))
}

/// Output path of an image.
///
/// Directories are sanitized like documents, but the file name is kept
/// verbatim so it still matches what embeds refer to.
pub fn image_output_path_for(image_path: &str) -> String {
    let (dir, file) = split_parent(image_path);
    join(&sanitize_dir(dir), file)
}

/// Relative link from the page at `from` to the file at `to`.
///
/// Both are output paths. The link is computed from the directory that
/// contains `from`.
pub fn relative_path(from: &str, to: &str) -> String {
    let from_segs: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to_segs: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();

    let from_dir = if from_segs.is_empty() {
        &from_segs[..]
    } else {
        &from_segs[..from_segs.len() - 1]
    };

    let common = from_dir
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from_dir.len() - common;
    let result = format!("{}{}", "../".repeat(ups), to_segs[common..].join("/"));

    if result.is_empty() {
        "./".to_string()
    } else {
        result
    }
}

/// Relative prefix from the page at `output_path` back to the site root.
///
/// Always ends with a slash: `./` at the root, `../` one level down.
pub fn relative_path_to_site_root(output_path: &str) -> String {
    let depth = output_path
        .split('/')
        .filter(|s| !s.is_empty())
        .count()
        .saturating_sub(1);

    if depth == 0 {
        "./".to_string()
    } else {
        "../".repeat(depth)
    }
}
