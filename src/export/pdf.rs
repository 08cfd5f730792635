//! Minimal single-font PDF writer for plain-text plans.

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 56.7;
const FONT_SIZE: f32 = 12.0;
const LEADING: f32 = 16.0;
// Helvetica at 12 pt averages roughly 6 pt per glyph across the text block.
const WRAP_CHARS: usize = 80;

// Czech letters missing from WinAnsiEncoding, placed on code points that are
// either undefined there or Latin-1 letters Czech text never needs. The font's
// /Differences array names the Helvetica glyph for each slot.
const CZECH_GLYPHS: [(char, u8, &str); 14] = [
    ('Č', 0x81, "Ccaron"),
    ('č', 0x8D, "ccaron"),
    ('Ď', 0x8F, "Dcaron"),
    ('ď', 0x90, "dcaron"),
    ('Ě', 0x9D, "Ecaron"),
    ('ě', 0xC3, "ecaron"),
    ('Ň', 0xC5, "Ncaron"),
    ('ň', 0xD0, "ncaron"),
    ('Ř', 0xD5, "Rcaron"),
    ('ř', 0xDE, "rcaron"),
    ('Ť', 0xE3, "Tcaron"),
    ('ť', 0xE5, "tcaron"),
    ('Ů', 0xF0, "Uring"),
    ('ů', 0xF5, "uring"),
];

fn font_encoding() -> String {
    let differences = CZECH_GLYPHS
        .iter()
        .map(|(_, code, glyph)| format!("{code} /{glyph}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("<< /Type /Encoding /BaseEncoding /WinAnsiEncoding /Differences [{differences}] >>")
}

/// Maps a char onto the font encoding. Latin-1 letters whose slots carry
/// Czech glyphs fold to their base letter; anything unknown becomes `?`.
fn encode_char(c: char) -> u8 {
    if let Some((_, code, _)) = CZECH_GLYPHS.iter().find(|(ch, _, _)| *ch == c) {
        return *code;
    }
    match c {
        '€' => 0x80,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        'Š' => 0x8A,
        'Ž' => 0x8E,
        'š' => 0x9A,
        'ž' => 0x9E,
        'Ã' | 'Å' => b'A',
        'ã' | 'å' => b'a',
        'Ð' => b'D',
        'ð' => b'd',
        'Õ' => b'O',
        'õ' => b'o',
        'Þ' | 'þ' => b'?',
        '\t' => b' ',
        c if (' '..='~').contains(&c) => c as u8,
        c if ('\u{a0}'..='\u{ff}').contains(&c) => c as u32 as u8,
        _ => b'?',
    }
}

fn encode_literal(line: &str, out: &mut Vec<u8>) {
    out.push(b'(');
    for c in line.chars() {
        let b = encode_char(c);
        if matches!(b, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out.push(b')');
}

/// Greedy word wrap on char counts; words longer than a line are split.
pub(crate) fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.chars().count() <= width {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split(' ') {
        let mut word = word.to_string();
        loop {
            let cur_len = current.chars().count();
            let word_len = word.chars().count();
            let needed = if cur_len == 0 { word_len } else { cur_len + 1 + word_len };
            if needed <= width {
                if cur_len > 0 {
                    current.push(' ');
                }
                current.push_str(&word);
                break;
            }
            if cur_len > 0 {
                out.push(std::mem::take(&mut current));
                continue;
            }
            let head: String = word.chars().take(width).collect();
            let tail: String = word.chars().skip(width).collect();
            out.push(head);
            if tail.is_empty() {
                break;
            }
            word = tail;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn page_stream(lines: &[String]) -> Vec<u8> {
    let mut s = Vec::new();
    s.extend_from_slice(
        format!(
            "BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{MARGIN} {:.2} Td\n",
            PAGE_HEIGHT - MARGIN - FONT_SIZE
        )
        .as_bytes(),
    );
    for line in lines {
        encode_literal(line, &mut s);
        s.extend_from_slice(b" Tj T*\n");
    }
    s.extend_from_slice(b"ET\n");
    s
}

/// Renders `text` as an A4 PDF, one text line per output line, paginated.
pub fn pdf_bytes(text: &str) -> Vec<u8> {
    let wrapped: Vec<String> = text
        .lines()
        .flat_map(|l| wrap_line(l, WRAP_CHARS))
        .collect();
    let per_page = ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING).floor().max(1.0) as usize;
    let mut pages: Vec<&[String]> = wrapped.chunks(per_page).collect();
    if pages.is_empty() {
        pages.push(&[]);
    }

    // Objects: 1 catalog, 2 page tree, 3 font, then (page, contents) pairs.
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()).into_bytes(),
        format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding {} >>",
            font_encoding()
        )
        .into_bytes(),
    ];
    for (i, lines) in pages.iter().enumerate() {
        let contents_id = page_ids[i] + 1;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {contents_id} 0 R >>"
            )
            .into_bytes(),
        );
        let stream = page_stream(lines);
        let mut obj = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        obj.extend_from_slice(&stream);
        obj.extend_from_slice(b"endstream");
        objects.push(obj);
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }
    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_at
        )
        .as_bytes(),
    );
    out
}
