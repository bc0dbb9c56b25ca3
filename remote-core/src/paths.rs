pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}

pub fn name_of(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

pub fn parent_path(path: &str) -> Option<String> {
    let normalized = normalize(path);
    if normalized == "/" {
        return None;
    }
    match normalized.rsplit_once('/') {
        Some(("", _)) => Some("/".to_string()),
        Some((dir, _)) => Some(dir.to_string()),
        None => None,
    }
}

pub fn join(folder: &str, name: &str) -> String {
    let folder = normalize(folder);
    if folder == "/" {
        format!("/{name}")
    } else {
        format!("{folder}/{name}")
    }
}

pub fn is_same_or_descendant(candidate: &str, ancestor: &str) -> bool {
    let candidate = normalize(candidate);
    let ancestor = normalize(ancestor);
    if candidate == ancestor || ancestor == "/" {
        return true;
    }
    candidate
        .strip_prefix(&ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}
