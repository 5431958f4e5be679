use super::buses::{DEFAULT_CONSUMER_CLASS, NODE_PROMOTION_FIELDS};
use super::*;
use feedr_core::{
    CapacitorControl, ConfigBody, ConnectionType, ControlLevel, Element, GeneratorType, LoadClass,
    LoadSite, RegulatorControl, Role, SwitchStatus, TransformerConnection, Volts,
};

const SECONDARY: &str = "\
ACSR336,0.3,0.025,0.72,500
CONST_X,0,30,3,30,6,30,3,26
XF50,2.5,4,0.5,50
REG_A,10,0.625,200,60
REG_BAD,10,0,200,60
";

/// Row with `name`, `code` and `phase` set plus the given (column, value) cells.
fn record(line: usize, name: &str, code: &str, phase: &str, cells: &[(usize, &str)]) -> SourceRecord {
    let mut fields = vec![String::new(); 51];
    fields[fields::NAME] = name.to_string();
    fields[fields::TYPE_CODE] = code.to_string();
    fields[fields::PHASE] = phase.to_string();
    fields[fields::X] = "10".to_string();
    fields[fields::Y] = "20".to_string();
    fields[fields::GUID] = format!("{{G-{}}}", name);
    for (column, value) in cells {
        fields[*column] = value.to_string();
    }
    SourceRecord::new(line, fields)
}

fn run(record: &SourceRecord) -> Translation {
    let lookup = HardwareLookup::parse(SECONDARY).unwrap();
    let canvas = CanvasTransform::identity();
    let ctx = TranslateContext {
        lookup: &lookup,
        canvas: &canvas,
    };
    translate(record, &ctx)
}

fn ok(record: &SourceRecord) -> NetworkObject {
    match run(record) {
        Ok(object) => object,
        Err((_, warnings)) => panic!("unexpected warnings: {:?}", warnings),
    }
}

fn warned(record: &SourceRecord) -> (NetworkObject, Vec<RowWarning>) {
    match run(record) {
        Ok(object) => panic!("expected warnings for {}", object.name),
        Err(partial) => partial,
    }
}

#[test]
fn type_codes_map_to_kinds() {
    assert_eq!(HardwareType::from_code("1"), HardwareType::OverheadLine);
    assert_eq!(HardwareType::from_code(" 13 "), HardwareType::Consumer);
    assert_eq!(
        HardwareType::from_code("7"),
        HardwareType::Unknown("7".to_string())
    );
}

#[test]
fn common_fields_are_extracted() {
    let mut rec = record(3, "Sub Station#1", "9", "7", &[(8, "12.47")]);
    rec = SourceRecord::new(3, {
        let mut f: Vec<String> = (0..51).map(|i| rec.field(i).to_string()).collect();
        f[fields::PARENT_GUID] = "{P-1}".to_string();
        f
    });
    let object = ok(&rec);
    assert_eq!(object.name, "Sub_Station_1");
    assert_eq!(object.guid, "G-Sub Station#1");
    assert_eq!(object.parent_guid, "P-1");
    assert_eq!(object.line, Some(3));
    assert_eq!(object.phases.to_string(), "ABCN");
    assert_eq!(object.nominal_voltage, Some(Volts(12470.0)));
    assert_eq!(object.coordinates.map(|p| (p.x, p.y)), Some((10.0, 20.0)));
}

#[test]
fn overhead_line_builds_conductors_spacing_and_configuration() {
    let rec = record(
        1,
        "OH1",
        "1",
        "7",
        &[
            (8, "ACSR336"),
            (9, "ACSR336"),
            (10, "ACSR336"),
            (11, "4/0"),
            (12, "CONST_X"),
            (13, "250"),
            (14, "0"),
        ],
    );
    let (object, warnings) = warned(&rec);
    // the neutral conductor is not in the lookup
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].category, "lookup");

    assert_eq!(object.phases.to_string(), "ABCN");
    match &object.element {
        Element::OverheadLine(line) => {
            assert_eq!(line.length.value(), 250.0);
            assert_eq!(line.connection, ConnectionType::Wye);
            assert_eq!(line.configuration.as_deref(), Some("OH1_config"));
        }
        other => panic!("unexpected element {:?}", other),
    }
    assert_eq!(object.configs.len(), 6);
    match &object.embedded("OH1_cond_A").unwrap().body {
        ConfigBody::OverheadLineConductor(c) => assert_eq!(c.resistance, 0.3),
        other => panic!("unexpected body {:?}", other),
    }
    match &object.embedded("OH1_cond_N").unwrap().body {
        ConfigBody::OverheadLineConductor(c) => assert_eq!(c.resistance, 0.592),
        other => panic!("unexpected body {:?}", other),
    }
    match &object.embedded("OH1_spacing").unwrap().body {
        ConfigBody::LineSpacing(s) => {
            assert_eq!(s.distance_ab.unwrap().value(), 3.0);
            assert_eq!(s.distance_an.unwrap().value(), 5.0);
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn delta_line_drops_neutral() {
    let rec = record(1, "UG1", "3", "6", &[(11, "ACSR336"), (13, "100"), (14, "1")]);
    let object = ok(&rec);
    assert_eq!(object.phases.to_string(), "BC");
    assert!(matches!(object.element, Element::UndergroundLine(_)));
    assert!(object.embedded("UG1_cond_N").is_none());
    assert!(object.embedded("UG1_cond_B").is_some());
}

#[test]
fn regulator_taps_band_and_control() {
    let rec = record(
        1,
        "R1",
        "4",
        "7",
        &[(8, "REG_A"), (9, "2"), (11, "124"), (14, "3"), (17, "1.5")],
    );
    let object = ok(&rec);
    match &object.embedded("R1_config").unwrap().body {
        ConfigBody::RegulatorConfiguration(c) => {
            assert_eq!(c.raise_taps, 16);
            assert_eq!(c.control_level, ControlLevel::Bank);
            assert_eq!(c.band_center, Volts(124.0));
            assert_eq!(c.band_width, Volts(3.0));
            assert_eq!(c.control, RegulatorControl::LineDropComp);
            assert_eq!(c.voltage_base, Volts(120.0));
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn regulator_with_zero_step_falls_back() {
    let rec = record(1, "R2", "4", "1", &[(8, "REG_BAD")]);
    let (object, warnings) = warned(&rec);
    assert!(warnings.iter().any(|w| w.category == "numeric"));
    match &object.embedded("R2_config").unwrap().body {
        ConfigBody::RegulatorConfiguration(c) => {
            assert_eq!(c.raise_taps, 16);
            assert_eq!(c.control_level, ControlLevel::Individual);
            assert_eq!(c.band_center, Volts(120.0));
            assert_eq!(c.band_width, Volts(2.0));
            assert_eq!(c.control, RegulatorControl::OutputVoltage);
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn transformer_ratings_and_connection() {
    let rec = record(1, "T1", "5", "4", &[(8, "XF50"), (12, "7.2"), (13, "0.12")]);
    let object = ok(&rec);
    match &object.embedded("T1_config").unwrap().body {
        ConfigBody::TransformerConfiguration(c) => {
            assert_eq!(c.connect_type, TransformerConnection::WyeWye);
            assert_eq!(c.power_a_rating.value(), 25.0);
            assert_eq!(c.power_b_rating.value(), 25.0);
            assert_eq!(c.power_c_rating.value(), 0.0);
            assert_eq!(c.power_rating.value(), 50.0);
            assert_eq!(c.primary_voltage, Volts(7200.0));
            assert_eq!(c.secondary_voltage.value().round(), 120.0);
            assert_eq!(c.shunt_impedance.unwrap().resistance, 200.0);
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn single_phase_transformer_defaults() {
    let rec = record(1, "T2", "5", "3", &[]);
    let (object, warnings) = warned(&rec);
    assert_eq!(warnings.len(), 2);
    match &object.embedded("T2_config").unwrap().body {
        ConfigBody::TransformerConfiguration(c) => {
            assert_eq!(c.connect_type, TransformerConnection::SinglePhase);
            assert_eq!(c.power_c_rating.value(), 25.0);
            assert!(c.shunt_impedance.is_none());
        }
        other => panic!("unexpected body {:?}", other),
    }
}

#[test]
fn simple_devices() {
    let cap = ok(&record(1, "C1", "2", "7", &[(8, "100"), (9, "100"), (10, "100"), (11, "7.2"), (12, "1")]));
    match cap.element {
        Element::Capacitor(c) => {
            assert_eq!(c.capacitor_b.value(), 100.0);
            assert_eq!(c.control, CapacitorControl::Volt);
        }
        other => panic!("unexpected element {:?}", other),
    }

    let sw = ok(&record(2, "S1", "6", "7", &[(8, "C")]));
    assert!(matches!(sw.element, Element::Switch(s) if s.status == SwitchStatus::Closed));
    let sw = ok(&record(3, "S2", "6", "7", &[(8, "O")]));
    assert!(matches!(sw.element, Element::Switch(s) if s.status == SwitchStatus::Open));

    let (fuse, _) = warned(&record(4, "F1", "10", "1", &[(8, "F"), (9, "0")]));
    assert!(matches!(fuse.element, Element::Fuse(f) if f.current_limit.value() == 9999.0));
    let rec = ok(&record(5, "RC1", "10", "7", &[(8, "R"), (9, "400")]));
    assert!(matches!(rec.element, Element::Recloser(r) if r.max_tries == 3));

    let (motor, _) = warned(&record(6, "M1", "11", "7", &[(8, "50"), (9, "0.48"), (10, "1.7")]));
    match motor.element {
        Element::Motor(m) => {
            assert_eq!(m.power_factor, 0.85);
            assert_eq!(m.rated_voltage, Volts(480.0));
        }
        other => panic!("unexpected element {:?}", other),
    }

    let generator = ok(&record(7, "G1", "12", "7", &[(8, "500"), (11, "2")]));
    assert!(matches!(
        generator.element,
        Element::Generator(g) if g.generator_type == GeneratorType::Inverter
    ));
}

#[test]
fn node_promotion_and_consumer_class() {
    assert_eq!(NODE_PROMOTION_FIELDS, [8, 9, 10, 11, 12, 13]);
    assert_eq!(DEFAULT_CONSUMER_CLASS, LoadClass::Residential);

    let plain = ok(&record(1, "N1", "8", "7", &[]));
    assert!(matches!(plain.element, Element::Node));

    let bus = ok(&record(2, "N2", "8", "7", &[(12, "3.5"), (14, "2")]));
    assert_eq!(bus.role(), Role::Nodable);
    match bus.element {
        Element::Load(load) => {
            assert_eq!(load.site, LoadSite::Bus);
            assert_eq!(load.class, LoadClass::Commercial);
            assert_eq!(load.demand.b.kvar.value(), 3.5);
        }
        other => panic!("unexpected element {:?}", other),
    }

    let (consumer, warnings) = warned(&record(3, "L1", "13", "4", &[(8, "10"), (9, "2"), (10, "9")]));
    assert_eq!(warnings.len(), 1);
    assert_eq!(consumer.role(), Role::Parentable);
    match consumer.element {
        Element::Load(load) => {
            assert_eq!(load.class, LoadClass::Residential);
            assert_eq!(load.demand.a.kw.value(), 5.0);
            assert_eq!(load.demand.b.kvar.value(), 1.0);
            assert!(load.demand.c.is_zero());
        }
        other => panic!("unexpected element {:?}", other),
    }
}

#[test]
fn malformed_rows_degrade_with_warnings() {
    let (unknown, warnings) = warned(&record(1, "X1", "77", "Q", &[]));
    assert!(matches!(unknown.element, Element::Node));
    assert_eq!(unknown.phases.to_string(), "ABCN");
    assert_eq!(warnings.len(), 2);

    let rec = record(2, "N9", "8", "7", &[(fields::X, "east"), (fields::Y, "5")]);
    let (object, warnings) = warned(&rec);
    assert!(object.coordinates.is_none());
    assert_eq!(warnings[0].category, "parse");

    let (source, warnings) = warned(&record(3, "SRC", "9", "7", &[]));
    assert_eq!(source.nominal_voltage, Some(Volts(7200.0)));
    assert_eq!(warnings[0].category, "voltage");
}

#[test]
fn batch_translation_keeps_names_unique() {
    let lookup = HardwareLookup::empty();
    let canvas = CanvasTransform::identity();
    let ctx = TranslateContext {
        lookup: &lookup,
        canvas: &canvas,
    };
    let mut dup = record(2, "OH1", "1", "7", &[(13, "10")]);
    dup = SourceRecord::new(2, {
        let mut f: Vec<String> = (0..51).map(|i| dup.field(i).to_string()).collect();
        f[fields::GUID] = "{OTHER}".to_string();
        f
    });
    let records = vec![record(1, "OH1", "1", "7", &[(13, "10")]), dup, record(3, "", "8", "7", &[])];
    let mut diagnostics = ConversionDiagnostics::new();
    let arena = translate_records(&records, &ctx, &mut diagnostics);

    let names: Vec<&str> = arena.iter().map(|(_, o)| o.name.as_str()).collect();
    assert_eq!(names, vec!["OH1", "OTHER", "G-"]);
    let renamed = arena.get(arena.find_by_name("OTHER").unwrap()).unwrap();
    assert_eq!(renamed.element.configuration(), Some("OTHER_config"));
    assert!(renamed.embedded("OTHER_spacing").is_some());
    assert_eq!(diagnostics.stats.records, 3);
}
