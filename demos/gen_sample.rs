use anyhow::Result;

fn main() -> Result<()> {
    let mut book = umya_spreadsheet::new_file();

    let sheet = book.get_active_sheet_mut();

    for (addr, header) in [("A1", "编号"), ("B1", "名称"), ("C1", "点位"), ("D1", "因子"), ("J1", "ID")] {
        sheet.get_cell_mut(addr).set_value(header);
    }

    // Old rows: already carry IDs 1 and 2.
    sheet.get_cell_mut("C2").set_value("P01");
    sheet.get_cell_mut("D2").set_value("SO2");
    sheet.get_cell_mut("J2").set_value_number(1);
    sheet.get_cell_mut("C3").set_value("P01");
    sheet.get_cell_mut("D3").set_value("NO2");
    sheet.get_cell_mut("J3").set_value_number(2);

    // Appended rows: C+D filled -> get IDs 3 and 4; row 6 lacks D and stays blank.
    sheet.get_cell_mut("C4").set_value("P02");
    sheet.get_cell_mut("D4").set_value("SO2");
    sheet.get_cell_mut("A5").set_value("x");
    sheet.get_cell_mut("B5").set_value("y");
    sheet.get_cell_mut("C5").set_value("P02");
    sheet.get_cell_mut("D5").set_value("NO2");
    sheet.get_cell_mut("C6").set_value("P03");

    umya_spreadsheet::writer::xlsx::write(&book, "sample.xlsx")?;
    println!("Wrote sample.xlsx");
    Ok(())
}
