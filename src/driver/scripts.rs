//! JavaScript generation for element operations
//!
//! Every element script resolves the locator afresh, picks the requested
//! match and evaluates to `null` when that match does not exist, so the
//! caller can tell "no element" apart from any real result.

use super::locator::{Key, Locator};

/// Evaluates to the document ready state
pub const READY_STATE_SCRIPT: &str = "document.readyState";

/// Quote a string as a JavaScript string literal
pub fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// Evaluate `script` with `args` bound to `arguments`.
///
/// Without arguments the script is sent unchanged.
pub fn with_arguments(script: &str, args: &[serde_json::Value]) -> String {
    if args.is_empty() {
        return script.to_string();
    }
    format!(
        "(function() {{ return eval({}); }}).apply(null, {})",
        js_string(script),
        serde_json::Value::Array(args.to_vec())
    )
}

/// Expression evaluating to an array of all current matches
pub fn matches_expression(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => {
            format!("Array.from(document.querySelectorAll({}))", js_string(selector))
        }
        Locator::Id(id) => format!(
            "(() => {{ const el = document.getElementById({}); return el ? [el] : []; }})()",
            js_string(id)
        ),
        Locator::TagName(tag) => {
            format!("Array.from(document.getElementsByTagName({}))", js_string(tag))
        }
        Locator::XPath(expression) => format!(
            "(() => {{ \
                const r = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                const out = []; \
                for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                return out; \
            }})()",
            js_string(expression)
        ),
    }
}

/// Number of current matches
pub fn count_script(locator: &Locator) -> String {
    format!("{}.length", matches_expression(locator))
}

/// Scripts bound to the `index`-th match of a locator
#[derive(Debug, Clone, Copy)]
pub struct DomScript<'a> {
    locator: &'a Locator,
    index: usize,
}

impl<'a> DomScript<'a> {
    pub fn new(locator: &'a Locator, index: usize) -> Self {
        Self { locator, index }
    }

    /// Run `body` with the element bound to `el`; `null` if there is no such match
    pub fn on_element(&self, body: &str) -> String {
        format!(
            "(() => {{ const el = {}[{}]; if (!el) return null; {} }})()",
            matches_expression(self.locator),
            self.index,
            body
        )
    }

    /// `{text, visible, enabled}` in one evaluation
    pub fn state(&self) -> String {
        self.on_element(
            r#"const style = window.getComputedStyle(el);
               const rect = el.getBoundingClientRect();
               const visible = style.display !== 'none'
                   && style.visibility !== 'hidden'
                   && style.opacity !== '0'
                   && rect.width > 0 && rect.height > 0;
               const text = (el.innerText ?? el.textContent ?? '').toString();
               return { text, visible, enabled: !el.disabled };"#,
        )
    }

    pub fn click(&self) -> String {
        self.on_element(
            "el.scrollIntoView({block: 'center', inline: 'center'}); el.click(); return true;",
        )
    }

    /// Pointer-enter sequence at the element's center
    pub fn hover(&self) -> String {
        self.on_element(
            r#"el.scrollIntoView({block: 'center', inline: 'center'});
               const rect = el.getBoundingClientRect();
               const at = { clientX: rect.left + rect.width / 2, clientY: rect.top + rect.height / 2, view: window, cancelable: true };
               el.dispatchEvent(new MouseEvent('mouseover', { ...at, bubbles: true }));
               el.dispatchEvent(new MouseEvent('mouseenter', { ...at, bubbles: false }));
               el.dispatchEvent(new MouseEvent('mousemove', { ...at, bubbles: true }));
               return true;"#,
        )
    }

    pub fn focus(&self) -> String {
        self.on_element("el.focus(); return true;")
    }

    /// Empty an input or a contenteditable editor
    pub fn clear(&self) -> String {
        self.on_element(
            r#"el.focus();
               if (el.isContentEditable) {
                   const range = document.createRange();
                   range.selectNodeContents(el);
                   const selection = window.getSelection();
                   selection.removeAllRanges();
                   selection.addRange(range);
                   document.execCommand('delete', false, null);
               } else {
                   el.value = '';
                   el.dispatchEvent(new Event('input', { bubbles: true }));
                   el.dispatchEvent(new Event('change', { bubbles: true }));
               }
               return true;"#,
        )
    }

    /// Append `text` at the end of the current value
    pub fn type_text(&self, text: &str) -> String {
        self.on_element(&format!(
            r#"const text = {};
               el.focus();
               if (el.isContentEditable) {{
                   const selection = window.getSelection();
                   selection.selectAllChildren(el);
                   selection.collapseToEnd();
                   document.execCommand('insertText', false, text);
               }} else {{
                   el.value = (el.value || '') + text;
                   el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                   el.dispatchEvent(new Event('change', {{ bubbles: true }}));
               }}
               return true;"#,
            js_string(text)
        ))
    }

    /// keydown/keypress/keyup with legacy `keyCode`/`which` populated.
    /// An uncancelled Enter in a form input submits the form.
    pub fn press_key(&self, key: Key) -> String {
        self.on_element(&format!(
            r#"el.focus();
               const fire = (type) => {{
                   const event = new KeyboardEvent(type, {{ key: {key}, code: {code}, bubbles: true, cancelable: true }});
                   Object.defineProperty(event, 'keyCode', {{ get: () => {key_code} }});
                   Object.defineProperty(event, 'which', {{ get: () => {key_code} }});
                   return el.dispatchEvent(event);
               }};
               const notCancelled = fire('keydown');
               fire('keypress');
               fire('keyup');
               if (notCancelled && el.form && el.tagName === 'INPUT') el.form.requestSubmit();
               return true;"#,
            key = js_string(key.name()),
            code = js_string(key.code()),
            key_code = key.key_code(),
        ))
    }

    /// Scroll into view and return the center point `{x, y}`
    pub fn center(&self) -> String {
        self.on_element(
            r#"el.scrollIntoView({block: 'center', inline: 'center'});
               const rect = el.getBoundingClientRect();
               return { x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 };"#,
        )
    }
}
