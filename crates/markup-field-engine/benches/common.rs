// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_field_content(size: usize) -> String {
    let base = r#"Intro with <b>bold</b>, <i>italic</i> and <a href="http://example.org/?a=1&amp;b=2" title="Example">a link</a>.<br>Then <abbr title="et cetera">etc.</abbr> and <acronym title="North Atlantic Treaty Organization">NATO</acronym>&nbsp;&nbsp;spacing<br>"#;
    base.repeat(size)
}

#[allow(dead_code)]
pub fn generate_office_paste(paragraphs: usize) -> String {
    let mut html = String::from(
        r#"<html><head><style>p.MsoNormal { margin: 0 }</style><script>track()</script></head><body>"#,
    );
    for i in 0..paragraphs {
        html.push_str(&format!(
            r#"<p class="MsoNormal" style="font-family: Calibri"><span lang="EN-GB">Paragraph {i} with <b style="color: red">bold</b> and <font face="Arial">font</font> text</span></p>"#
        ));
        if i % 5 == 0 {
            html.push_str(r#"<table><tr><td>cell</td><td><del>gone</del></td></tr></table>"#);
        }
    }
    html.push_str("</body></html>");
    html
}
