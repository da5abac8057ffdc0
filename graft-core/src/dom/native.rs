//! Native Element Properties
//!
//! The settable fields an HTML element exposes beyond its attributes. The
//! property differ asks this table whether a prop name is a "native field"
//! of the node, and the node uses it to decide how a property write lands:
//! reflected into an attribute, or stored as live state.

/// How a native property is backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NativeProp {
    /// Reflects to a string attribute.
    Text(&'static str),
    /// Reflects to a presence attribute.
    Flag(&'static str),
    /// Reflects to a numeric attribute.
    Number(&'static str),
    /// Live text state; defaults to the same-named attribute.
    LiveText,
    /// Live boolean state; defaults to presence of the same-named attribute.
    LiveFlag,
    /// Live numeric state.
    LiveNumber,
    /// Exists but cannot be assigned.
    ReadOnly,
}

const GLOBAL: &[(&str, NativeProp)] = &[
    ("id", NativeProp::Text("id")),
    ("className", NativeProp::Text("class")),
    ("title", NativeProp::Text("title")),
    ("lang", NativeProp::Text("lang")),
    ("dir", NativeProp::Text("dir")),
    ("slot", NativeProp::Text("slot")),
    ("accessKey", NativeProp::Text("accesskey")),
    ("hidden", NativeProp::Flag("hidden")),
    ("tabIndex", NativeProp::Number("tabindex")),
];

const INPUT: &[(&str, NativeProp)] = &[
    ("value", NativeProp::LiveText),
    ("checked", NativeProp::LiveFlag),
    ("type", NativeProp::Text("type")),
    ("name", NativeProp::Text("name")),
    ("placeholder", NativeProp::Text("placeholder")),
    ("disabled", NativeProp::Flag("disabled")),
    ("readOnly", NativeProp::Flag("readonly")),
    ("required", NativeProp::Flag("required")),
    ("multiple", NativeProp::Flag("multiple")),
    ("min", NativeProp::Text("min")),
    ("max", NativeProp::Text("max")),
    ("step", NativeProp::Text("step")),
    ("accept", NativeProp::Text("accept")),
    ("src", NativeProp::Text("src")),
    ("alt", NativeProp::Text("alt")),
    ("size", NativeProp::Number("size")),
    ("width", NativeProp::Number("width")),
    ("height", NativeProp::Number("height")),
    ("list", NativeProp::ReadOnly),
    ("form", NativeProp::ReadOnly),
];

const TEXTAREA: &[(&str, NativeProp)] = &[
    ("value", NativeProp::LiveText),
    ("name", NativeProp::Text("name")),
    ("placeholder", NativeProp::Text("placeholder")),
    ("disabled", NativeProp::Flag("disabled")),
    ("readOnly", NativeProp::Flag("readonly")),
    ("required", NativeProp::Flag("required")),
    ("rows", NativeProp::Number("rows")),
    ("cols", NativeProp::Number("cols")),
    ("form", NativeProp::ReadOnly),
];

const SELECT: &[(&str, NativeProp)] = &[
    ("value", NativeProp::LiveText),
    ("selectedIndex", NativeProp::LiveNumber),
    ("name", NativeProp::Text("name")),
    ("disabled", NativeProp::Flag("disabled")),
    ("multiple", NativeProp::Flag("multiple")),
    ("required", NativeProp::Flag("required")),
    ("size", NativeProp::Number("size")),
    ("form", NativeProp::ReadOnly),
];

const OPTION: &[(&str, NativeProp)] = &[
    ("value", NativeProp::Text("value")),
    ("selected", NativeProp::LiveFlag),
    ("disabled", NativeProp::Flag("disabled")),
    ("label", NativeProp::Text("label")),
];

const BUTTON: &[(&str, NativeProp)] = &[
    ("type", NativeProp::Text("type")),
    ("name", NativeProp::Text("name")),
    ("value", NativeProp::Text("value")),
    ("disabled", NativeProp::Flag("disabled")),
    ("form", NativeProp::ReadOnly),
];

const ANCHOR: &[(&str, NativeProp)] = &[
    ("href", NativeProp::Text("href")),
    ("target", NativeProp::Text("target")),
    ("rel", NativeProp::Text("rel")),
    ("download", NativeProp::Text("download")),
    ("hreflang", NativeProp::Text("hreflang")),
    ("type", NativeProp::Text("type")),
];

const IMAGE: &[(&str, NativeProp)] = &[
    ("src", NativeProp::Text("src")),
    ("alt", NativeProp::Text("alt")),
    ("loading", NativeProp::Text("loading")),
    ("width", NativeProp::Number("width")),
    ("height", NativeProp::Number("height")),
];

const IFRAME: &[(&str, NativeProp)] = &[
    ("src", NativeProp::Text("src")),
    ("name", NativeProp::Text("name")),
    ("allow", NativeProp::Text("allow")),
    ("width", NativeProp::Text("width")),
    ("height", NativeProp::Text("height")),
];

const MEDIA: &[(&str, NativeProp)] = &[
    ("src", NativeProp::Text("src")),
    ("preload", NativeProp::Text("preload")),
    ("autoplay", NativeProp::Flag("autoplay")),
    ("controls", NativeProp::Flag("controls")),
    ("loop", NativeProp::Flag("loop")),
    ("muted", NativeProp::LiveFlag),
    ("poster", NativeProp::Text("poster")),
    ("width", NativeProp::Number("width")),
    ("height", NativeProp::Number("height")),
];

const CANVAS: &[(&str, NativeProp)] = &[
    ("width", NativeProp::Number("width")),
    ("height", NativeProp::Number("height")),
];

const FORM: &[(&str, NativeProp)] = &[
    ("action", NativeProp::Text("action")),
    ("method", NativeProp::Text("method")),
    ("target", NativeProp::Text("target")),
    ("name", NativeProp::Text("name")),
    ("noValidate", NativeProp::Flag("novalidate")),
];

const LABEL: &[(&str, NativeProp)] = &[
    ("htmlFor", NativeProp::Text("for")),
    ("form", NativeProp::ReadOnly),
];

const LINK: &[(&str, NativeProp)] = &[
    ("href", NativeProp::Text("href")),
    ("rel", NativeProp::Text("rel")),
    ("type", NativeProp::Text("type")),
];

const SCRIPT: &[(&str, NativeProp)] = &[
    ("src", NativeProp::Text("src")),
    ("type", NativeProp::Text("type")),
];

const TABLE_CELL: &[(&str, NativeProp)] = &[
    ("colSpan", NativeProp::Number("colspan")),
    ("rowSpan", NativeProp::Number("rowspan")),
];

const LIST: &[(&str, NativeProp)] = &[
    ("start", NativeProp::Number("start")),
    ("reversed", NativeProp::Flag("reversed")),
];

const OPENABLE: &[(&str, NativeProp)] = &[("open", NativeProp::Flag("open"))];

const PROGRESS: &[(&str, NativeProp)] = &[
    ("value", NativeProp::Number("value")),
    ("max", NativeProp::Number("max")),
];

fn tag_table(local_name: &str) -> &'static [(&'static str, NativeProp)] {
    match local_name {
        "input" => INPUT,
        "textarea" => TEXTAREA,
        "select" => SELECT,
        "option" => OPTION,
        "button" => BUTTON,
        "a" | "area" => ANCHOR,
        "img" => IMAGE,
        "iframe" => IFRAME,
        "video" | "audio" => MEDIA,
        "canvas" => CANVAS,
        "form" => FORM,
        "label" => LABEL,
        "link" => LINK,
        "script" | "source" => SCRIPT,
        "td" | "th" => TABLE_CELL,
        "ol" => LIST,
        "details" | "dialog" => OPENABLE,
        "progress" | "meter" => PROGRESS,
        _ => &[],
    }
}

/// Look up a native property of an HTML element.
pub(crate) fn lookup(local_name: &str, name: &str) -> Option<NativeProp> {
    tag_table(local_name)
        .iter()
        .chain(GLOBAL)
        .find(|(prop, _)| *prop == name)
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_specific_entries_win_over_globals() {
        assert_eq!(lookup("input", "value"), Some(NativeProp::LiveText));
        assert_eq!(lookup("option", "value"), Some(NativeProp::Text("value")));
        assert_eq!(lookup("div", "value"), None);
        assert_eq!(lookup("div", "className"), Some(NativeProp::Text("class")));
    }
}
