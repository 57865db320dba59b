use egui::Color32;

/// The subset of the RAL classic range the viewer draws with.
///
/// Values are sRGB approximations.
pub const RAL_COLORS: &[(u16, &str, Color32)] = &[
    (1003, "Signal yellow", Color32::from_rgb(249, 169, 0)),
    (1018, "Zinc yellow", Color32::from_rgb(248, 243, 53)),
    (2009, "Traffic orange", Color32::from_rgb(226, 83, 3)),
    (2010, "Signal orange", Color32::from_rgb(208, 93, 40)),
    (3014, "Antique pink", Color32::from_rgb(211, 110, 112)),
    (3020, "Traffic red", Color32::from_rgb(187, 30, 16)),
    (4008, "Signal violet", Color32::from_rgb(144, 70, 132)),
    (5005, "Signal blue", Color32::from_rgb(21, 72, 137)),
    (5015, "Sky blue", Color32::from_rgb(34, 113, 179)),
    (5021, "Water blue", Color32::from_rgb(0, 125, 130)),
    (6018, "Yellow green", Color32::from_rgb(87, 166, 57)),
    (6027, "Light green", Color32::from_rgb(126, 186, 181)),
    (6032, "Signal green", Color32::from_rgb(39, 133, 75)),
    (6033, "Mint turquoise", Color32::from_rgb(73, 126, 118)),
    (7040, "Window grey", Color32::from_rgb(157, 161, 170)),
    (7046, "Telegrey 2", Color32::from_rgb(130, 137, 143)),
    (7047, "Telegrey 4", Color32::from_rgb(208, 208, 208)),
    (9003, "Signal white", Color32::from_rgb(244, 244, 244)),
    (9004, "Signal black", Color32::from_rgb(40, 40, 40)),
    (9011, "Graphite black", Color32::from_rgb(28, 28, 33)),
];
