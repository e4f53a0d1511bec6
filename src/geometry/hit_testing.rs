use std::sync::Arc;

use crate::element::{ElementRef, Erasable};
use crate::path::ErasePath;

/// Selects the elements a finished stroke erases.
///
/// Depth-first, in paint order. Elements that are not erasable or don't touch
/// the stroke are skipped; `Deep` containers contribute their children
/// instead of themselves.
pub fn walk(elements: &[ElementRef], path: &ErasePath) -> Vec<ElementRef> {
    let mut targets = Vec::new();
    collect_targets(elements, path, &mut targets);
    targets
}

fn collect_targets(elements: &[ElementRef], path: &ErasePath, targets: &mut Vec<ElementRef>) {
    for element in elements {
        let erasable = element.erasable();
        if !erasable.is_erasable() || !element.intersects_path(path) {
            continue;
        }
        if erasable == Erasable::Deep && element.is_container() {
            collect_targets(&element.children(), path, targets);
        } else {
            targets.push(Arc::clone(element));
        }
    }
}
