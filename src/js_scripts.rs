// src/js_scripts.rs

use crate::stats::StatsEntry;
use crate::surface::HostTable;

/// DevTools binding the injected observer reports through.
pub const EVENT_BINDING: &str = "ytroEvents";

/// Evaluated on every new document when the binding is exposed.
pub const BINDING_SHIM: &str = r#"
(kind, name) => {
    window.__ytroBindingName = name;
}
"#;

pub const CONTENT_READY: &str = r##"
() => {
    return !!document.querySelector("#content #page-manager");
}
"##;

// Shared by the observer and the active-surface scan. Expects `table` in scope.
const HELPERS: &str = r##"
        function refOf(anchor) {
            if (!anchor.dataset.ytroRef) {
                window.__ytroNextRef = (window.__ytroNextRef || 0) + 1;
                anchor.dataset.ytroRef = String(window.__ytroNextRef);
            }
            return {
                key: Number(anchor.dataset.ytroRef),
                href: anchor.href || anchor.getAttribute("href") || "",
            };
        }

        function rootOf(element) {
            return {
                tag: element.tagName.toLowerCase(),
                subtype: element.getAttribute(table.subtype_attr),
            };
        }

        function ruleFor(element) {
            const root = rootOf(element);
            if (!table.surface_tags.includes(root.tag)) {
                return null;
            }
            const exact = table.rules.find(r => r.tag === root.tag && (r.subtype === null || r.subtype === root.subtype));
            if (exact) {
                return exact;
            }
            return root.tag === table.fallback.tag ? table.fallback : null;
        }

        function resolveAnchors(element) {
            const rule = ruleFor(element);
            if (!rule) {
                return [];
            }
            return Array.from(element.querySelectorAll(rule.css)).map(refOf);
        }

        function representativeAnchor(renderer) {
            const anchors = Array.from(renderer.querySelectorAll("a"));
            return anchors.find(a => table.title_ids.includes(a.id)) || anchors[1] || null;
        }
"##;

const OBSERVER_TEMPLATE: &str = r##"
(function() {
    try {
        const table = __YTRO_TABLE__;
__YTRO_HELPERS__
        function emit(event) {
            try {
                window.__YTRO_BINDING__(JSON.stringify(event));
            } catch (error) {
                console.error("ytro: failed to deliver event", error);
            }
        }

        function observeSurface(root) {
            if (root.__ytroObserved) {
                return;
            }
            root.__ytroObserved = true;

            const observer = new MutationObserver(mutations => {
                const items = [];
                mutations.forEach(mutation => {
                    try {
                        if (mutation.type === "attributes"
                            && mutation.target.getAttribute(table.role_attr) === table.active_role) {
                            emit({
                                type: "activated",
                                root: rootOf(mutation.target),
                                anchors: resolveAnchors(mutation.target),
                            });
                        }

                        if (mutation.type === "childList") {
                            mutation.addedNodes.forEach(node => {
                                try {
                                    if (node.nodeType !== Node.ELEMENT_NODE) {
                                        return;
                                    }
                                    if (!table.renderer_tags.includes(node.tagName.toLowerCase())) {
                                        return;
                                    }
                                    const anchor = representativeAnchor(node);
                                    items.push(anchor ? refOf(anchor) : null);
                                } catch (error) {
                                    console.warn("ytro: skipped renderer", error);
                                }
                            });
                        }
                    } catch (error) {
                        console.warn("ytro: skipped mutation", error);
                    }
                });

                if (items.length > 0) {
                    emit({ type: "inserted", root: rootOf(root), items: items });
                }
            });

            observer.observe(root, {
                attributes: true,
                attributeFilter: [table.role_attr],
                childList: true,
                subtree: true,
            });
        }

        const container = document.querySelector(table.container);
        if (!container) {
            console.error("ytro: content container not found");
            return false;
        }

        container.querySelectorAll(table.surface_tags.join(", ")).forEach(observeSurface);

        if (window.__ytroStructureObserver) {
            window.__ytroStructureObserver.disconnect();
        }
        const structureObserver = new MutationObserver(mutations => {
            mutations.forEach(mutation => {
                mutation.addedNodes.forEach(node => {
                    if (node.nodeType === Node.ELEMENT_NODE
                        && table.surface_tags.includes(node.tagName.toLowerCase())) {
                        observeSurface(node);
                    }
                });
            });
        });
        structureObserver.observe(container, { childList: true });
        window.__ytroStructureObserver = structureObserver;

        console.log("✅ ytro observers attached");
        return true;
    } catch (error) {
        console.error("❌ ytro observer setup failed", error);
        return false;
    }
})()
"##;

const ACTIVE_SCAN_TEMPLATE: &str = r##"
(function() {
    const table = __YTRO_TABLE__;
__YTRO_HELPERS__
    const container = document.querySelector(table.container);
    const active = container
        && container.querySelector("[" + table.role_attr + "='" + table.active_role + "']");
    if (!active) {
        return "null";
    }
    return JSON.stringify({ root: rootOf(active), anchors: resolveAnchors(active) });
})()
"##;

const ANNOTATE_TEMPLATE: &str = r##"
(function(key, labels) {
    const anchor = document.querySelector('[data-ytro-ref="' + key + '"]');
    if (!anchor || !anchor.parentElement) {
        return false;
    }
    const parent = anchor.parentElement;
    labels.forEach(label => {
        Array.from(parent.children)
            .filter(child => child.classList.contains(label.class))
            .forEach(stale => parent.removeChild(stale));

        const el = document.createElement("div");
        el.setAttribute("style", label.style);
        el.setAttribute("class", label.class);
        el.innerText = String(label.value);
        parent.appendChild(el);
    });
    return true;
})(__YTRO_KEY__, __YTRO_LABELS__)
"##;

fn with_table(template: &str) -> String {
    template
        .replace("__YTRO_HELPERS__", HELPERS)
        .replace("__YTRO_TABLE__", &HostTable::new().to_json())
        .replace("__YTRO_BINDING__", EVENT_BINDING)
}

pub fn observer_script() -> String {
    with_table(OBSERVER_TEMPLATE)
}

/// Evaluates to the JSON text of the active surface scan, `"null"` when nothing is active.
pub fn active_scan_script() -> String {
    with_table(ACTIVE_SCAN_TEMPLATE)
}

pub fn annotate_script(key: u64, entry: StatsEntry) -> String {
    use crate::annotate::LabelKind;

    let labels: Vec<serde_json::Value> = LabelKind::ALL
        .iter()
        .map(|kind| {
            serde_json::json!({
                "class": kind.class(),
                "style": kind.style(),
                "value": kind.value(entry),
            })
        })
        .collect();
    ANNOTATE_TEMPLATE
        .replace("__YTRO_KEY__", &key.to_string())
        .replace("__YTRO_LABELS__", &serde_json::Value::from(labels).to_string())
}
