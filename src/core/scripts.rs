//! JavaScript function expressions evaluated through [`PageAutomation::evaluate`].
//!
//! Every script is a function; arguments are passed as a JSON array and spread
//! into its parameters.
//!
//! [`PageAutomation::evaluate`]: crate::domain::ports::PageAutomation::evaluate

/// `(selector) => bool`
pub const DISPATCH_CHANGE_EVENTS: &str = r#"(sel) => {
    const el = document.querySelector(sel);
    if (!el) return false;
    for (const type of ['input', 'change', 'blur']) {
        el.dispatchEvent(new Event(type, { bubbles: true }));
    }
    return true;
}"#;

/// `(selector, value) => bool`
pub const SYNC_DATE_INPUT: &str = r#"(sel, value) => {
    const input = document.querySelector(sel);
    if (!input) return false;
    input.value = value;
    for (const type of ['input', 'change', 'blur']) {
        input.dispatchEvent(new Event(type, { bubbles: true }));
    }
    return true;
}"#;

/// `(monthSelector, yearSelector) => { month, year }`
pub const CALENDAR_HEADER: &str = r#"(monthSel, yearSel) => {
    const month = document.querySelector(monthSel);
    const year = document.querySelector(yearSel);
    return {
        month: month ? month.innerText.trim() : null,
        year: year ? year.innerText.trim() : null,
    };
}"#;

/// `(formSelector) => bool`
pub const SUBMIT_FORM: &str = r#"(sel) => {
    const form = document.querySelector(sel);
    if (!form) return false;
    form.dispatchEvent(new Event('submit', { bubbles: true, cancelable: true }));
    return true;
}"#;

/// `(urlFragment, cardSelector) => bool`
pub const RESULTS_READY: &str = r#"(fragment, cardSel) =>
    location.href.includes(fragment) || document.querySelectorAll(cardSel).length > 0"#;

/// `(selector, code) => bool`
pub const FIELD_VALUE_CONTAINS: &str = r#"(sel, code) => {
    const el = document.querySelector(sel);
    return !!el && (el.value || '').includes(code);
}"#;

pub const SCROLL_TO_BOTTOM: &str = r#"() => {
    window.scrollTo(0, document.body.scrollHeight);
    return document.body.scrollHeight;
}"#;

/// `(cardSel, priceSel, markedSel, imageSel, codeSel) => [{ prices, airline_alt, airline_code }]`
pub const COLLECT_CARDS: &str = r#"(cardSel, priceSel, markedSel, imageSel, codeSel) =>
    [...document.querySelectorAll(cardSel)].map(card => ({
        prices: [...card.querySelectorAll(priceSel)].map(el => ({
            text: (el.textContent || '').trim(),
            marked: markedSel ? !!el.closest(markedSel) : false,
        })),
        airline_alt: card.querySelector(imageSel)?.getAttribute('alt') ?? null,
        airline_code: card.querySelector(codeSel)?.textContent?.trim() ?? null,
    }))"#;
