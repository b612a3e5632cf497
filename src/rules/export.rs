use chrono::NaiveDate;

use crate::model::attendance::AttendanceRecord;

pub const CSV_HEADER: &str = "No,Nama,Jabatan,Regional,Sekolah,Status,Keterangan,Tanggal,Jam Isi";

pub fn export_filename(today: NaiveDate) -> String {
    format!("absensi-foksi-{}.csv", today.format("%Y-%m-%d"))
}

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// One header line plus one line per record, each terminated by `\n`.
pub fn attendance_csv(records: &[AttendanceRecord]) -> String {
    let mut csv = String::with_capacity(CSV_HEADER.len() + 1 + records.len() * 96);
    csv.push_str(CSV_HEADER);
    csv.push('\n');

    for (index, record) in records.iter().enumerate() {
        let fields = [
            quoted(&record.name),
            quoted(&record.position),
            quoted(&record.region),
            quoted(&record.institution),
            quoted(record.status.as_ref()),
            quoted(&record.note),
            quoted(&record.date.format("%Y-%m-%d").to_string()),
            quoted(&record.submitted_at.to_string()),
        ];
        csv.push_str(&(index + 1).to_string());
        for field in fields {
            csv.push(',');
            csv.push_str(&field);
        }
        csv.push('\n');
    }

    csv
}
