use super::*;

/// Trimmed map name. `None` if blank or if it contains a space or a quote.
pub fn normalize_map_name(map: Option<&str>) -> Option<String> {
    let map = map?.trim();
    if map.is_empty() || map.contains(' ') || map.contains('"') {
        return None;
    }
    Some(map.to_owned())
}

/// The map a switch lands on: override, then the mode's default map,
/// then the live map, then `FALLBACK_MAP`.
pub fn resolve_target_map(
    mode: &ModeDefinition,
    target_override: Option<&str>,
    current_map: Option<&str>,
) -> String {
    [target_override, mode.default_map.as_deref(), current_map]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|map| !map.is_empty())
        .unwrap_or(FALLBACK_MAP)
        .to_owned()
}

/// Normalized and deduplicated map pool of `mode`.
/// An empty pool yields the single map a switch would land on.
pub fn get_selectable_maps(mode: &ModeDefinition, current_map: Option<&str>) -> Vec<String> {
    let mut maps: Vec<String> = vec![];
    for map in &mode.map_pool {
        let Some(map) = normalize_map_name(Some(map)) else {
            continue;
        };
        if !maps.iter().any(|m| eq_ignore_case(m, &map)) {
            maps.push(map);
        }
    }
    if !maps.is_empty() {
        return maps;
    }

    let fallback = resolve_target_map(mode, None, current_map);
    normalize_map_name(Some(&fallback)).into_iter().collect()
}

fn find_selectable<'a>(maps: &'a [String], map: &str) -> Option<&'a String> {
    maps.iter().find(|m| eq_ignore_case(m, map))
}

/// Map a vote for `mode` should target.
///
/// An explicit selection must name a selectable map.
/// An implicit one is used only if it happens to be selectable,
/// otherwise the preferred map of the mode is chosen.
pub fn try_resolve_target(
    mode: &ModeDefinition,
    requested_map: Option<&str>,
    explicit: bool,
    current_map: Option<&str>,
) -> Option<String> {
    let maps = get_selectable_maps(mode, current_map);
    if maps.is_empty() {
        return None;
    }

    let requested = normalize_map_name(requested_map);
    if explicit {
        let requested = requested?;
        return find_selectable(&maps, &requested).cloned();
    }

    if let Some(requested) = requested {
        if let Some(map) = find_selectable(&maps, &requested) {
            return Some(map.clone());
        }
    }

    let preferred = normalize_map_name(mode.default_map.as_deref())
        .and_then(|default_map| find_selectable(&maps, &default_map).cloned());
    Some(preferred.unwrap_or_else(|| maps[0].clone()))
}

/// Whether switching to `map` would leave the live map unchanged.
pub fn is_current_map_for_target(map: &str, current_map: Option<&str>) -> bool {
    match (normalize_map_name(current_map), normalize_map_name(Some(map))) {
        (Some(current), Some(target)) => eq_ignore_case(&current, &target),
        _ => false,
    }
}
