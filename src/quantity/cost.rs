quantity!(Cost, suffix: "PLN", precision: 2);
