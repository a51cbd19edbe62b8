use blockdoc::block::embed::EmbedService;
use blockdoc::block::{Block, FileData, ListStyle, TableCell};
use blockdoc::document::Document;
use blockdoc::parser::{Parser, ParserOptions};
use blockdoc::render::{render_blocks, render_document};

fn import(html: &str) -> Vec<Block> {
    let import = Parser::new(html.to_string(), 0).parse();
    import.blocks
}

#[test]
fn paragraph_and_header_example() {
    assert_eq!(
        import("<p>Hi</p><h2>Title</h2>"),
        vec![
            Block::paragraph("Hi"),
            Block::Header {
                level: 2,
                content: "Title".to_string()
            },
        ]
    );
}

#[test]
fn import_is_idempotent() {
    let html = "<p>One <b>two</b></p><h3>Three</h3><ul><li>a</li><li>b</li></ul>";
    assert_eq!(import(html), import(html));
}

#[test]
fn bare_text_becomes_a_paragraph() {
    assert_eq!(import("loose text"), vec![Block::paragraph("loose text")]);
    // Whitespace-only text is not content.
    assert_eq!(import("  \n\t "), vec![]);
}

#[test]
fn missing_root_yields_empty_sequence() {
    assert_eq!(import(""), vec![]);
}

#[test]
fn inline_run_merges_text_and_formatting() {
    assert_eq!(
        import("Hello <b>world</b>!<p>next</p>"),
        vec![
            Block::paragraph("Hello <b>world</b>!"),
            Block::paragraph("next"),
        ]
    );
}

#[test]
fn wrapper_elements_recurse() {
    assert_eq!(
        import("<div><section><p>deep</p></section></div>"),
        vec![Block::paragraph("deep")]
    );
}

#[test]
fn wrapper_with_only_text_becomes_a_paragraph() {
    // An unrecognized element with no element children but real text:
    // its inner content is kept, the wrapper markup is not.
    assert_eq!(
        import("<x-note>remember this</x-note>"),
        vec![Block::paragraph("remember this")]
    );
}

#[test]
fn code_blocks_keep_text_and_language() {
    let blocks = import("<pre><code class=\"language-rust\">if a &lt; b { }</code></pre>");
    assert_eq!(
        blocks,
        vec![Block::Code {
            content: "if a < b { }".to_string(),
            language: "rust".to_string(),
        }]
    );

    let blocks = import("<pre><code>plain</code></pre>");
    assert_eq!(
        blocks,
        vec![Block::Code {
            content: "plain".to_string(),
            language: "plaintext".to_string(),
        }]
    );
}

#[test]
fn lists_tables_and_rules() {
    let blocks = import(
        "<ol><li>first</li><li>second</li></ol>\
         <hr>\
         <table><thead><tr><th>H</th></tr></thead><tbody><tr><td>c</td></tr></tbody></table>",
    );
    assert_eq!(
        blocks,
        vec![
            Block::List {
                style: ListStyle::Ordered,
                items: vec!["first".to_string(), "second".to_string()],
            },
            Block::Delimiter,
            Block::Table {
                rows: vec![
                    vec![TableCell {
                        content: "H".to_string(),
                        is_header: true
                    }],
                    vec![TableCell {
                        content: "c".to_string(),
                        is_header: false
                    }],
                ],
            },
        ]
    );
}

#[test]
fn figure_with_caption_becomes_an_image() {
    let blocks = import(
        "<figure><img src=\"/up/cat.png\" alt=\"a cat\" width=\"640\">\
         <figcaption>The cat</figcaption></figure>",
    );
    assert_eq!(
        blocks,
        vec![Block::Image {
            url: "/up/cat.png".to_string(),
            alt: "a cat".to_string(),
            caption: Some("The cat".to_string()),
            width: Some(640),
            height: None,
        }]
    );
}

#[test]
fn pasted_markup_is_sanitized_at_import() {
    let blocks = import("<p>safe <b>bold</b><script>alert(1)</script></p>");
    assert_eq!(blocks, vec![Block::paragraph("safe <b>bold</b>")]);

    let blocks = import("<p><a href=\"javascript:x()\" onclick=\"y()\">text</a></p>");
    assert_eq!(blocks, vec![Block::paragraph("text")]);
}

#[test]
fn known_service_iframe_becomes_an_embed() {
    let blocks = import(
        "<iframe src=\"https://www.youtube.com/embed/dQw4w9WgXcQ\" allowfullscreen></iframe>",
    );
    assert_eq!(
        blocks,
        vec![Block::Embed {
            service: EmbedService::Youtube,
            id: Some("dQw4w9WgXcQ".to_string()),
            source: "https://www.youtube.com/embed/dQw4w9WgXcQ".to_string(),
            html: None,
            caption: None,
        }]
    );
}

#[test]
fn unknown_iframe_host_is_skipped_with_a_warning() {
    let html = "<iframe src=\"https://evil.example/x\"></iframe>";
    let import = Parser::new(html.to_string(), 0).parse();
    assert!(import.blocks.is_empty());
    assert!(import.has_warnings());
}

#[test]
fn extra_embed_hosts_are_honored() {
    let html = "<iframe src=\"https://maps.example.com/widget\"></iframe>";
    let options = ParserOptions {
        extra_embed_hosts: vec!["maps.example.com".to_string()],
    };
    let import = Parser::with_options(html.to_string(), 0, options).parse();
    assert_eq!(import.blocks.len(), 1);
    let Block::Embed { service, html, .. } = &import.blocks[0] else {
        panic!("expected an embed");
    };
    assert_eq!(*service, EmbedService::Unknown);
    assert!(html.as_deref().unwrap_or_default().starts_with("<iframe"));
}

#[test]
fn file_attachment_marker_round_trips() {
    let original = Block::File {
        data: FileData {
            url: "/up/report.pdf".to_string(),
            name: "report.pdf".to_string(),
            mime: "application/pdf".to_string(),
            size: 123_456,
        },
    };
    let html = render_blocks(std::slice::from_ref(&original));
    assert_eq!(import(&html), vec![original]);
}

#[test]
fn render_then_import_reproduces_supported_blocks() {
    let blocks = vec![
        Block::paragraph("Plain with <b>bold</b> and <a href=\"https://e.com/\">link</a>"),
        Block::Header {
            level: 2,
            content: "Section".to_string(),
        },
        Block::Quote {
            content: "said someone".to_string(),
        },
        Block::Code {
            content: "let x = 1 < 2;".to_string(),
            language: "rust".to_string(),
        },
        Block::List {
            style: ListStyle::Unordered,
            items: vec!["one".to_string(), "two <i>soft</i>".to_string()],
        },
        Block::Image {
            url: "/up/a.png".to_string(),
            alt: "pic".to_string(),
            caption: Some("cap".to_string()),
            width: Some(100),
            height: Some(50),
        },
        Block::Table {
            rows: vec![vec![
                TableCell {
                    content: "h".to_string(),
                    is_header: true,
                },
                TableCell {
                    content: "v".to_string(),
                    is_header: false,
                },
            ]],
        },
        Block::Delimiter,
        Block::Embed {
            service: EmbedService::Youtube,
            id: Some("dQw4w9WgXcQ".to_string()),
            source: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            html: None,
            caption: None,
        },
        Block::File {
            data: FileData {
                url: "/up/notes.txt".to_string(),
                name: "notes.txt".to_string(),
                mime: "text/plain".to_string(),
                size: 42,
            },
        },
    ];

    let document = Document::new(blocks.clone(), 1_700_000_000_000);
    let html = render_document(&document);
    let reimported = import(&html);
    assert_eq!(reimported, blocks);
}

#[test]
fn document_json_survives_render_import_cycle() {
    let document = Document::new(
        vec![
            Block::paragraph("Hi"),
            Block::Header {
                level: 2,
                content: "Title".to_string(),
            },
        ],
        7,
    );
    let json = document.to_json().unwrap();
    let parsed = Document::from_json(&json).unwrap();
    assert_eq!(import(&render_document(&parsed)), document.blocks);
}
