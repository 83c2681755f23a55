use lopdf::{Dictionary, Object};

use super::fonts::FontResources;

/// Build the resources dictionary shared by every page of a slip
///
/// All pages use the same fonts, and every registered image is listed so a
/// page can draw any of them.
pub fn page_resources(fonts: &FontResources, xobject_dict: &Dictionary) -> Dictionary {
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts.to_dictionary()));

    if !xobject_dict.is_empty() {
        let mut xobject_resources = Dictionary::new();
        for (key, value) in xobject_dict.iter() {
            xobject_resources.set(key.to_vec(), value.clone());
        }
        resources.set("XObject", Object::Dictionary(xobject_resources));
    }

    resources.set(
        "ProcSet",
        vec![
            Object::Name(b"PDF".to_vec()),
            Object::Name(b"Text".to_vec()),
            Object::Name(b"ImageC".to_vec()),
        ],
    );
    resources
}
