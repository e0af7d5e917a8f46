const WIDTH: usize = 0x10;

fn printable(chr: u8) -> char {
    if (0x20..0x7f).contains(&chr) {
        chr as char
    } else {
        '.'
    }
}

/// Format one row: offset, hex bytes in two groups of 8, then text.
fn format_row(offset: usize, row: &[u8]) -> String {
    let mut out = format!("{:04x}", offset);
    for i in 0..WIDTH {
        if i % 8 == 0 {
            out.push(' ');
        }
        match row.get(i) {
            Some(b) => out += &format!(" {:02x}", b),
            None => out += "   ",
        }
    }
    out += "  |";
    out.extend(row.iter().copied().map(printable));
    out.push('|');
    out
}

/// Rows of a classic hexdump, ending with the total length on its own.
pub fn hexdump_lines(data: &[u8]) -> impl Iterator<Item = String> + '_ {
    data.chunks(WIDTH)
        .enumerate()
        .map(|(i, row)| format_row(i * WIDTH, row))
        .chain(std::iter::once(format!("{:04x}", data.len())))
}

pub fn hexdump(data: &[u8]) {
    for line in hexdump_lines(data) {
        println!("{}", line);
    }
}

pub fn ehexdump_prefix(prefix: &str, data: &[u8]) {
    for line in hexdump_lines(data) {
        eprintln!("{}{}", prefix, line);
    }
}

pub fn hexdump_format(data: &[u8]) -> String {
    hexdump_lines(data).map(|line| line + "\n").collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_row() {
        let lines: Vec<String> = hexdump_lines(b"AB\x00").collect();
        assert_eq!(
            lines,
            vec![
                "0000  41 42 00                                          |AB.|".to_owned(),
                "0003".to_owned(),
            ]
        );
    }

    #[test]
    fn full_rows() {
        let data = [0x61; 0x20];
        let lines: Vec<String> = hexdump_lines(&data).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("0010  61"));
        assert!(lines[1].ends_with("|aaaaaaaaaaaaaaaa|"));
        assert_eq!(lines[2], "0020");
    }

    #[test]
    fn empty() {
        assert_eq!(hexdump_format(b""), "0000\n");
    }
}
